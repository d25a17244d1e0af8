// bookcart/src/engine/dispatch.rs

//! Reads and quantity mutations, routed to whichever cart is authoritative.
//!
//! Guest mutations apply synchronously to the local cart. Account mutations are
//! planned against the line the storefront is displaying, then submitted; the
//! line is pending until the response arrives. A failed remote mutation changes
//! nothing locally: the error is returned and broadcast, and the next read
//! corrects any drift.

use crate::cart::line::{AccountId, CartLine, CatalogItem, ItemId, MergeLine};
use crate::cart::quantity::{self, QuantityChange, QuantityPlan};
use crate::engine::control::MutationOutcome;
use crate::engine::definition::CartEngine;
use crate::engine::events::CartEvent;
use crate::engine::source::{CartSource, CartView};
use crate::error::{CartError, CartResult};
use tracing::{event, instrument, Level};

impl CartEngine {
  /// Reads the authoritative cart once.
  #[instrument(name = "CartEngine::view", skip_all, err(Display))]
  pub async fn view(&self) -> CartResult<CartView> {
    let source = self.active_source();
    let lines = match &source {
      CartSource::Guest => self.local.snapshot().lines().to_vec(),
      CartSource::Account(account) => self.remote.get_cart(account).await?,
    };
    Ok(CartView { source, lines })
  }

  /// Reads the account cart. Fails with `NotAuthenticated` for guests.
  pub async fn remote_lines(&self) -> CartResult<Vec<CartLine>> {
    let account = self.identity().ok_or(CartError::NotAuthenticated)?;
    self.remote.get_cart(&account).await
  }

  /// Adds `amount` of `item`, creating the line or incrementing it, clamped to
  /// stock.
  ///
  /// For an account the current remote line is read first so the submitted
  /// quantity is the clamped total; the server's stock for an existing line
  /// takes precedence over the catalog's.
  #[instrument(name = "CartEngine::add", skip_all, fields(item_id = %item.id, amount = amount), err(Display))]
  pub async fn add(&self, item: &CatalogItem, amount: u32) -> CartResult<MutationOutcome> {
    match self.active_source() {
      CartSource::Guest => {
        let planned = self
          .local
          .with_mut(|cart| cart.add(item, amount, self.config.max_line_quantity));
        Ok(self.after_local_change(&item.id, planned))
      }
      CartSource::Account(account) => {
        let current_lines = match self.remote.get_cart(&account).await {
          Ok(lines) => lines,
          Err(e) => {
            self.report_failure(&CartSource::Account(account.clone()), Some(&item.id), &e);
            return Err(e);
          }
        };
        let existing = current_lines.into_iter().find(|l| l.item_id == item.id);
        let (current, stock) = existing.map_or((0, item.stock), |l| (l.quantity, l.stock));
        self
          .mutate_remote(&account, &item.id, current, stock, QuantityChange::Add(amount))
          .await
      }
    }
  }

  pub async fn increase(&self, line: &CartLine) -> CartResult<MutationOutcome> {
    self.mutate(line, QuantityChange::Increase).await
  }

  /// Decreases by one. At quantity 1 the line is removed, never set to zero.
  pub async fn decrease(&self, line: &CartLine) -> CartResult<MutationOutcome> {
    self.mutate(line, QuantityChange::Decrease).await
  }

  /// Sets an absolute quantity, clamped to `[0, stock]`. Zero removes.
  pub async fn set_quantity(&self, line: &CartLine, quantity: u32) -> CartResult<MutationOutcome> {
    self.mutate(line, QuantityChange::Set(quantity)).await
  }

  pub async fn remove(&self, line: &CartLine) -> CartResult<MutationOutcome> {
    self.mutate(line, QuantityChange::Remove).await
  }

  /// Empties the authoritative cart.
  #[instrument(name = "CartEngine::clear", skip_all, err(Display))]
  pub async fn clear(&self) -> CartResult<()> {
    let source = self.active_source();
    match &source {
      CartSource::Guest => {
        let dropped = self.local.with_mut(|cart| cart.clear());
        self.persist_local();
        event!(Level::INFO, dropped, "Guest cart cleared.");
      }
      CartSource::Account(account) => {
        if let Err(e) = self.remote.clear_cart(account).await {
          self.report_failure(&source, None, &e);
          return Err(e);
        }
        event!(Level::INFO, %account, "Account cart cleared.");
      }
    }
    self.emit(CartEvent::Cleared(source));
    Ok(())
  }

  /// Checkout preflight: asks the remote store which lines of the authoritative
  /// cart cannot be fulfilled. Read-only; returns the short item ids.
  #[instrument(name = "CartEngine::validate_availability", skip_all, err(Display))]
  pub async fn validate_availability(&self) -> CartResult<Vec<ItemId>> {
    let source = self.active_source();
    let lines: Vec<MergeLine> = match &source {
      CartSource::Guest => self.local.snapshot().to_merge_lines(),
      CartSource::Account(account) => match self.remote.get_cart(account).await {
        Ok(current) => current.iter().map(CartLine::to_merge_line).collect(),
        Err(e) => {
          self.report_failure(&source, None, &e);
          return Err(e);
        }
      },
    };
    if lines.is_empty() {
      return Ok(Vec::new());
    }

    let short = match self.remote.validate_availability(&lines).await {
      Ok(short) => short,
      Err(e) => {
        self.report_failure(&source, None, &e);
        return Err(e);
      }
    };
    if short.is_empty() {
      event!(Level::DEBUG, lines = lines.len(), "All lines available.");
    } else {
      event!(Level::INFO, short = short.len(), "Some lines cannot be fulfilled.");
    }
    Ok(short)
  }

  #[instrument(
    name = "CartEngine::mutate",
    skip_all,
    fields(item_id = %line.item_id, change = ?change),
    err(Display)
  )]
  async fn mutate(&self, line: &CartLine, change: QuantityChange) -> CartResult<MutationOutcome> {
    match self.active_source() {
      CartSource::Guest => {
        let planned = self
          .local
          .with_mut(|cart| cart.change(&line.item_id, change, self.config.max_line_quantity))?;
        Ok(self.after_local_change(&line.item_id, planned))
      }
      CartSource::Account(account) => {
        self
          .mutate_remote(&account, &line.item_id, line.quantity, line.stock, change)
          .await
      }
    }
  }

  fn after_local_change(&self, item_id: &ItemId, planned: QuantityPlan) -> MutationOutcome {
    if planned != QuantityPlan::Unchanged {
      self.persist_local();
      self.emit(CartEvent::LineChanged {
        source: CartSource::Guest,
        item_id: item_id.clone(),
        quantity: match planned {
          QuantityPlan::Set(q) => Some(q),
          _ => None,
        },
      });
    }
    event!(Level::DEBUG, %item_id, ?planned, "Guest cart mutation applied.");
    MutationOutcome::from_plan(item_id.clone(), planned)
  }

  async fn mutate_remote(
    &self,
    account: &AccountId,
    item_id: &ItemId,
    current: u32,
    stock: u32,
    change: QuantityChange,
  ) -> CartResult<MutationOutcome> {
    let ceiling = quantity::ceiling(stock, self.config.max_line_quantity);
    let planned = quantity::plan(current, change, ceiling);
    if planned == QuantityPlan::Unchanged {
      event!(Level::DEBUG, %item_id, current, ceiling, "Mutation clamped to current quantity, nothing submitted.");
      return Ok(MutationOutcome::Unchanged {
        item_id: item_id.clone(),
      });
    }

    let Some(_pending) = self.begin_pending(item_id) else {
      event!(Level::DEBUG, %item_id, "Request already in flight for line, mutation not submitted.");
      return Ok(MutationOutcome::Pending {
        item_id: item_id.clone(),
      });
    };

    let submitted = match planned {
      QuantityPlan::Set(q) => self.remote.set_quantity(account, item_id, q).await,
      _ => self.remote.remove_line(account, item_id).await,
    };

    let source = CartSource::Account(account.clone());
    match submitted {
      Ok(()) => {
        event!(Level::DEBUG, %account, %item_id, ?planned, "Account cart mutation acknowledged.");
        self.emit(CartEvent::LineChanged {
          source,
          item_id: item_id.clone(),
          quantity: match planned {
            QuantityPlan::Set(q) => Some(q),
            _ => None,
          },
        });
        Ok(MutationOutcome::from_plan(item_id.clone(), planned))
      }
      Err(e) => {
        self.report_failure(&source, Some(item_id), &e);
        Err(e)
      }
    }
  }

  fn report_failure(&self, source: &CartSource, item_id: Option<&ItemId>, error: &CartError) {
    event!(Level::WARN, ?source, item_id = ?item_id, %error, "Remote cart request failed, display left unchanged.");
    self.emit(CartEvent::MutationFailed {
      source: source.clone(),
      item_id: item_id.cloned(),
      reason: error.to_string(),
    });
  }
}
