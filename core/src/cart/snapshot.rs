// bookcart/src/cart/snapshot.rs

//! JSON snapshots of the guest cart, so an embedding application can restore it
//! at start-up.

use crate::cart::local::LocalCart;
use crate::error::{CartError, CartResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{event, instrument, Level};

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
  version: u32,
  saved_at: DateTime<Utc>,
  cart: LocalCart,
}

/// Writes `cart` to `path`. The file is written beside the target and renamed
/// into place so a crash never leaves a half-written snapshot.
#[instrument(name = "snapshot::save", skip_all, fields(path = %path.display(), lines = cart.len()), err(Display))]
pub fn save(cart: &LocalCart, path: &Path) -> CartResult<()> {
  let file = SnapshotFile {
    version: SNAPSHOT_VERSION,
    saved_at: Utc::now(),
    cart: cart.clone(),
  };
  let bytes = serde_json::to_vec_pretty(&file)?;

  let tmp_path = tmp_path_for(path);
  let io_err = |source| CartError::Snapshot {
    path: path.to_path_buf(),
    source,
  };
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent).map_err(io_err)?;
  }
  fs::write(&tmp_path, bytes).map_err(io_err)?;
  fs::rename(&tmp_path, path).map_err(io_err)?;

  event!(Level::DEBUG, "Local cart snapshot written.");
  Ok(())
}

/// Reads a snapshot from `path`. A missing file is an empty cart. Restored lines
/// are normalized before they are handed out.
#[instrument(name = "snapshot::load", skip_all, fields(path = %path.display()), err(Display))]
pub fn load(path: &Path) -> CartResult<LocalCart> {
  let bytes = match fs::read(path) {
    Ok(bytes) => bytes,
    Err(e) if e.kind() == ErrorKind::NotFound => {
      event!(Level::DEBUG, "No local cart snapshot found, starting empty.");
      return Ok(LocalCart::new());
    }
    Err(source) => {
      return Err(CartError::Snapshot {
        path: path.to_path_buf(),
        source,
      })
    }
  };

  let file: SnapshotFile = serde_json::from_slice(&bytes)?;
  if file.version != SNAPSHOT_VERSION {
    event!(Level::WARN, version = file.version, "Unsupported snapshot version, starting empty.");
    return Ok(LocalCart::new());
  }

  let mut cart = file.cart;
  cart.normalize();
  event!(Level::INFO, lines = cart.len(), saved_at = %file.saved_at, "Local cart restored from snapshot.");
  Ok(cart)
}

/// Like [`load`], but a snapshot that no longer parses is discarded with a
/// warning and the guest starts with an empty cart. I/O failures other than a
/// missing file are still returned.
pub fn load_or_empty(path: &Path) -> CartResult<LocalCart> {
  match load(path) {
    Err(CartError::Serialization(e)) => {
      event!(Level::WARN, path = %path.display(), error = %e, "Discarding unreadable local cart snapshot, starting empty.");
      Ok(LocalCart::new())
    }
    other => other,
  }
}

// `<file name>.tmp` beside the target. Appending keeps it distinct from the
// target even when the target already ends in `.tmp`.
fn tmp_path_for(path: &Path) -> PathBuf {
  let mut name = path.file_name().map(OsString::from).unwrap_or_default();
  name.push(".tmp");
  path.with_file_name(name)
}
