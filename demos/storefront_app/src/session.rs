// demos/storefront_app/src/session.rs

//! A scripted storefront session: browse as a guest, sign in, merge, edit the
//! account cart and run the checkout preflight.

use crate::catalog;
use crate::errors::{AppError, Result};
use crate::state::AppState;
use anyhow::Context;
use bookcart::store::{Fault, RemoteOp};
use bookcart::{CartEvent, CartSource, CartView, CatalogItem, MergeOutcome};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// What the session did, for the closing log line.
#[derive(Debug, Default)]
pub struct SessionReport {
  pub merged_attempt: Option<Uuid>,
  pub failed_merges: usize,
  pub checkout_ready: bool,
}

/// Logs every cart event until the engine is dropped.
pub fn spawn_event_logger(mut rx: broadcast::Receiver<CartEvent>) -> JoinHandle<()> {
  tokio::spawn(async move {
    loop {
      match rx.recv().await {
        Ok(CartEvent::MergeFailed {
          attempt,
          reason,
          retryable,
          ..
        }) => {
          warn!(%attempt, retryable, %reason, "[event] merge failed");
        }
        Ok(CartEvent::MutationFailed { item_id, reason, .. }) => {
          warn!(item_id = ?item_id, %reason, "[event] mutation failed");
        }
        Ok(cart_event) => info!(event = ?cart_event, "[event]"),
        Err(RecvError::Lagged(skipped)) => warn!(skipped, "[event] logger lagged behind"),
        Err(RecvError::Closed) => break,
      }
    }
  })
}

#[instrument(name = "session::run", skip_all, fields(account = %state.config.demo_account))]
pub async fn run(state: &AppState) -> Result<SessionReport> {
  let mut report = SessionReport::default();
  let engine = &state.engine;

  // 1. Browse as a guest.
  for (title, amount) in [("Dune", 2), ("Emma", 5), ("Brave New World", 1)] {
    let item = lookup(state, title)?;
    let outcome = engine.add(item, amount).await?;
    info!(title, amount, ?outcome, "Guest added to cart.");
  }
  log_view("guest", &engine.view().await?);

  // 2. Sign in while the cart service is flaky: the first merge fails and the
  //    guest lines stay put.
  state.store.fail_next(
    RemoteOp::MergeCart,
    Fault::Unavailable("cart service timed out".to_string()),
  );
  match engine.sign_in(state.config.demo_account.clone()).await {
    Ok(outcome) => record_merge(&mut report, outcome),
    Err(e) => {
      report.failed_merges += 1;
      let e = AppError::from(e);
      if !e.is_recoverable() {
        return Err(e);
      }
      warn!(error = %e, pending = engine.pending_guest_lines().len(), "Merge failed, guest lines kept.");
    }
  }

  // 3. The next render re-evaluates merge-on-login and retries once.
  let outcome = engine.reconcile().await?;
  record_merge(&mut report, outcome);
  let again = engine.reconcile().await?;
  info!(?again, "Re-render after merge.");

  // 4. Edit the account cart.
  let view = engine.view().await?;
  log_view("account", &view);
  for line in &view.lines {
    let controls = engine.controls(line);
    info!(title = %line.title, quantity = line.quantity, stock = line.stock, ?controls, "Line controls.");
    let outcome = if controls.can_increase {
      engine.increase(line).await?
    } else {
      engine.decrease(line).await?
    };
    info!(title = %line.title, ?outcome, "Account line updated.");
  }

  // 5. Checkout preflight after someone else buys the last copies of Dune.
  if let Some(dune) = catalog::find(&state.catalog, "Dune") {
    state.store.set_stock(&dune.id, 1);
  }
  match preflight(state).await {
    Ok(()) => report.checkout_ready = true,
    Err(e) if e.is_recoverable() => warn!(error = %e, "Checkout preflight failed."),
    Err(e) => return Err(e),
  }

  let final_view = engine.view().await?;
  let rendered = serde_json::to_string(&final_view).context("rendering final cart view")?;
  info!(cart = %rendered, "Final account cart.");

  engine.sign_out();
  if engine.active_source() != CartSource::Guest {
    error!("Signed out but the account cart is still active.");
    return Err(AppError::Internal("identity not cleared on sign-out".to_string()));
  }
  log_view("guest after sign-out", &engine.view().await?);

  Ok(report)
}

async fn preflight(state: &AppState) -> Result<()> {
  let short = state.engine.validate_availability().await?;
  if short.is_empty() {
    info!("All lines can be fulfilled.");
    return Ok(());
  }
  Err(AppError::CheckoutBlocked {
    short: short.into_iter().map(|id| id.to_string()).collect(),
  })
}

fn lookup<'a>(state: &'a AppState, title: &str) -> Result<&'a CatalogItem> {
  catalog::find(&state.catalog, title).ok_or_else(|| AppError::Internal(format!("'{}' is not in the catalog", title)))
}

fn record_merge(report: &mut SessionReport, outcome: MergeOutcome) {
  match outcome {
    MergeOutcome::Merged { attempt, lines } => {
      info!(%attempt, lines, "Guest cart merged into the account cart.");
      report.merged_attempt = Some(attempt);
    }
    other => info!(?other, "Merge-on-login did not run."),
  }
}

fn log_view(label: &str, view: &CartView) {
  let summary = view.summary();
  info!(
    label,
    source = ?view.source,
    lines = summary.line_count,
    items = summary.item_count,
    subtotal_cents = summary.subtotal_cents,
    "Cart view."
  );
}
