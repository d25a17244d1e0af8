// bookcart/src/engine/merge.rs

//! The merge-on-login guard as an explicit state machine.
//!
//! ```text
//!   Idle --begin--> Merging --succeed--> Done
//!                      |
//!                      +----fail-----> Idle
//! ```
//!
//! `begin` is the only way into `Merging` and is refused while an attempt is in
//! flight or after one succeeded, which gives the at-most-one-in-flight
//! guarantee. Each attempt carries an id; a completion whose id no longer
//! matches (the identity changed and the machine was reset meanwhile) is
//! ignored.

use crate::cart::line::AccountId;
use crate::engine::control::SkipReason;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MergeState {
  #[default]
  Idle,
  Merging {
    attempt: Uuid,
    account: AccountId,
  },
  Done {
    attempt: Uuid,
    account: AccountId,
    completed_at: DateTime<Utc>,
  },
}

impl MergeState {
  pub fn is_idle(&self) -> bool {
    matches!(self, MergeState::Idle)
  }

  pub fn is_merging(&self) -> bool {
    matches!(self, MergeState::Merging { .. })
  }

  pub fn is_done(&self) -> bool {
    matches!(self, MergeState::Done { .. })
  }

  /// Why a new attempt may not start, or `None` when idle.
  pub fn blocked_reason(&self) -> Option<SkipReason> {
    match self {
      MergeState::Idle => None,
      MergeState::Merging { .. } => Some(SkipReason::InFlight),
      MergeState::Done { .. } => Some(SkipReason::AlreadyMerged),
    }
  }

  /// `Idle -> Merging`. Returns the new attempt id.
  pub(crate) fn begin(&mut self, account: &AccountId) -> Result<Uuid, SkipReason> {
    if let Some(reason) = self.blocked_reason() {
      return Err(reason);
    }
    let attempt = Uuid::new_v4();
    *self = MergeState::Merging {
      attempt,
      account: account.clone(),
    };
    Ok(attempt)
  }

  /// `Merging(attempt) -> Done`. False if `attempt` is not the one in flight.
  pub(crate) fn succeed(&mut self, attempt: Uuid) -> bool {
    match self {
      MergeState::Merging {
        attempt: current,
        account,
      } if *current == attempt => {
        *self = MergeState::Done {
          attempt,
          account: account.clone(),
          completed_at: Utc::now(),
        };
        true
      }
      _ => false,
    }
  }

  /// `Merging(attempt) -> Idle`, re-arming the guard for a retry. False if
  /// `attempt` is not the one in flight.
  pub(crate) fn fail(&mut self, attempt: Uuid) -> bool {
    match self {
      MergeState::Merging { attempt: current, .. } if *current == attempt => {
        *self = MergeState::Idle;
        true
      }
      _ => false,
    }
  }

  /// Back to `Idle` unconditionally, for an identity change.
  pub(crate) fn reset(&mut self) {
    *self = MergeState::Idle;
  }
}
