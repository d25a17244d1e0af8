// bookcart/src/engine/reconcile.rs

//! Identity transitions and merge-on-login.

use crate::cart::line::{AccountId, MergeLine};
use crate::engine::control::{MergeOutcome, SkipReason};
use crate::engine::definition::CartEngine;
use crate::engine::events::CartEvent;
use crate::engine::source::CartSource;
use crate::error::{CartError, CartResult};
use tracing::{event, instrument, Level};
use uuid::Uuid;

impl CartEngine {
  /// Records a signed-in identity and evaluates merge-on-login.
  ///
  /// Signing in again with the identity already present keeps the merge state,
  /// so repeated calls from re-renders never submit a second batch. A different
  /// identity starts a fresh `Idle` state.
  #[instrument(name = "CartEngine::sign_in", skip_all, fields(account = %account), err(Display))]
  pub async fn sign_in(&self, account: AccountId) -> CartResult<MergeOutcome> {
    let changed = {
      let mut session = self.session.lock();
      if session.identity.as_ref() == Some(&account) {
        false
      } else {
        session.identity = Some(account.clone());
        session.merge.reset();
        true
      }
    };
    if changed {
      event!(Level::INFO, "Identity present, account cart is now authoritative.");
      self.emit(CartEvent::SourceChanged(CartSource::Account(account)));
    }
    self.reconcile().await
  }

  /// Drops the identity. The guest cart becomes authoritative again; whatever
  /// it still holds (nothing after a successful merge) is what the guest sees.
  #[instrument(name = "CartEngine::sign_out", skip_all)]
  pub fn sign_out(&self) {
    let previous = {
      let mut session = self.session.lock();
      session.merge.reset();
      session.identity.take()
    };
    if let Some(account) = previous {
      event!(Level::INFO, %account, "Identity cleared, guest cart is now authoritative.");
      self.emit(CartEvent::SourceChanged(CartSource::Guest));
    }
  }

  /// Evaluates merge-on-login for the current state.
  ///
  /// Call on every state change that might qualify (sign-in, re-render, an
  /// explicit retry). Submits the whole guest cart when an identity is present,
  /// the guest cart is non-empty and the merge state is `Idle`; otherwise
  /// returns `MergeOutcome::Skipped` without touching anything.
  ///
  /// The state moves to `Merging` before the request goes out, so a concurrent
  /// call sees `InFlight`. On success the guest cart is cleared and the state is
  /// `Done`. On any failure, including a partially rejected batch, the guest
  /// cart is left intact, the state returns to `Idle` and the error is returned.
  #[instrument(name = "CartEngine::reconcile", skip_all, err(Display))]
  pub async fn reconcile(&self) -> CartResult<MergeOutcome> {
    let (attempt, account, batch) = match self.prepare_merge() {
      Ok(prepared) => prepared,
      Err(reason) => {
        event!(Level::DEBUG, ?reason, "Merge-on-login skipped.");
        return Ok(MergeOutcome::Skipped(reason));
      }
    };

    event!(Level::INFO, %attempt, %account, lines = batch.len(), "Submitting guest cart for merge.");
    self.emit(CartEvent::MergeStarted {
      attempt,
      account: account.clone(),
      lines: batch.len(),
    });

    let submitted = self.remote.merge_cart(&account, &batch).await.and_then(|ack| {
      if ack.is_complete() {
        Ok(())
      } else {
        Err(CartError::PartialMergeFailure { rejected: ack.rejected })
      }
    });

    match submitted {
      Ok(()) => Ok(self.complete_merge(attempt, account, batch.len())),
      Err(e) => {
        self.abort_merge(attempt, &account, &e);
        Err(e)
      }
    }
  }

  // Checks the preconditions and moves Idle -> Merging under one lock, so two
  // callers can never both pass.
  fn prepare_merge(&self) -> Result<(Uuid, AccountId, Vec<MergeLine>), SkipReason> {
    let mut session = self.session.lock();
    let account = session.identity.clone().ok_or(SkipReason::Guest)?;
    if let Some(reason) = session.merge.blocked_reason() {
      return Err(reason);
    }
    let batch = self.local.read().to_merge_lines();
    if batch.is_empty() {
      return Err(SkipReason::EmptyLocalCart);
    }
    let attempt = session.merge.begin(&account)?;
    Ok((attempt, account, batch))
  }

  fn complete_merge(&self, attempt: Uuid, account: AccountId, lines: usize) -> MergeOutcome {
    let current = {
      let mut session = self.session.lock();
      if session.merge.succeed(attempt) {
        self.local.write().clear();
        true
      } else {
        false
      }
    };

    if !current {
      event!(Level::WARN, %attempt, %account, "Merge acknowledged after the identity changed. Guest cart kept.");
      return MergeOutcome::Superseded { attempt };
    }

    self.persist_local();
    event!(Level::INFO, %attempt, %account, lines, "Guest cart merged into account cart.");
    self.emit(CartEvent::MergeSucceeded {
      attempt,
      account: account.clone(),
      lines,
    });
    if self.config.refresh_after_merge {
      self.emit(CartEvent::RefreshRequested(account));
    }
    MergeOutcome::Merged { attempt, lines }
  }

  fn abort_merge(&self, attempt: Uuid, account: &AccountId, error: &CartError) {
    let rearmed = self.session.lock().merge.fail(attempt);
    if rearmed {
      event!(Level::WARN, %attempt, %account, %error, "Merge failed. Guest cart kept, merge re-armed for retry.");
    } else {
      event!(Level::WARN, %attempt, %account, %error, "Superseded merge attempt failed.");
    }
    self.emit(CartEvent::MergeFailed {
      attempt,
      account: account.clone(),
      reason: error.to_string(),
      retryable: error.is_retryable(),
    });
  }
}
