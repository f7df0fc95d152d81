//! Order router
//!
//! Front door for strategy commands. Validates them at submission, has the
//! book create new orders in `PendingNew` and schedules the delayed action.
//! Nothing here changes a live order.

use tracing::{debug, warn};
use types::errors::{CommandError, InvalidOrderError, UnknownOrderError};
use types::ids::{InstrumentId, OrderId};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderType, Side};
use types::Timestamp;

use matching_engine::MatchingEngine;

use crate::actions::{Action, ActionKind, ActionQueue};
use crate::latency::{LatencyKind, LatencyModel};

/// Validated price and quantity of a command
fn validate_terms(
    price: f64,
    quantity: f64,
    order_type: OrderType,
) -> Result<(Price, Quantity), InvalidOrderError> {
    if !(quantity.is_finite() && quantity > 0.0) {
        return Err(InvalidOrderError::NonPositiveQuantity(quantity.to_string()));
    }
    let raw = quantity;
    let quantity = Quantity::try_from_f64(raw)
        .filter(|q| *q <= Quantity::max_order())
        .ok_or_else(|| InvalidOrderError::QuantityTooLarge(raw.to_string()))?;
    if !quantity.is_positive() {
        return Err(InvalidOrderError::NonPositiveQuantity(raw.to_string()));
    }

    let parsed = Price::try_from_f64(price)
        .ok_or_else(|| InvalidOrderError::InvalidPrice(price.to_string()))?;
    if order_type == OrderType::Limit && parsed.is_zero() {
        return Err(InvalidOrderError::InvalidPrice(price.to_string()));
    }
    Ok((parsed, quantity))
}

/// Turns strategy commands into scheduled actions
#[derive(Debug)]
pub struct OrderRouter {
    latency: LatencyModel,
    queue: ActionQueue,
}

impl OrderRouter {
    pub fn new(latency: LatencyModel) -> Self {
        Self {
            latency,
            queue: ActionQueue::new(),
        }
    }

    pub fn latency(&self) -> &LatencyModel {
        &self.latency
    }

    /// SendOrder: validate, register in `PendingNew`, schedule the Send
    #[allow(clippy::too_many_arguments)]
    pub fn send_order(
        &mut self,
        engine: &mut MatchingEngine,
        now: Timestamp,
        instrument: InstrumentId,
        price: f64,
        quantity: f64,
        side: Side,
        order_type: OrderType,
    ) -> Result<OrderId, CommandError> {
        let (price, quantity) = validate_terms(price, quantity, order_type).map_err(|err| {
            warn!(instrument = %instrument, error = %err, "Rejected order at submission");
            err
        })?;

        let order_id = engine.create_order(instrument, side, order_type, price, quantity, now);
        self.schedule(ActionKind::Send, order_id, now);
        Ok(order_id)
    }

    /// CancelOrder: the id must have been issued; terminal targets are fine
    pub fn cancel_order(
        &mut self,
        engine: &MatchingEngine,
        now: Timestamp,
        order_id: OrderId,
    ) -> Result<(), CommandError> {
        self.ensure_known(engine, order_id)?;
        self.schedule(ActionKind::Cancel, order_id, now);
        Ok(())
    }

    /// ModifyOrder: validated like a Send, delayed like any action
    pub fn modify_order(
        &mut self,
        engine: &MatchingEngine,
        now: Timestamp,
        order_id: OrderId,
        price: f64,
        quantity: f64,
    ) -> Result<(), CommandError> {
        let order = self.ensure_known(engine, order_id)?;
        let (price, quantity) = validate_terms(price, quantity, order.order_type).map_err(|err| {
            warn!(order_id = %order_id, error = %err, "Rejected modify at submission");
            err
        })?;
        self.schedule(ActionKind::Modify { price, quantity }, order_id, now);
        Ok(())
    }

    fn ensure_known<'e>(&self, engine: &'e MatchingEngine, order_id: OrderId) -> Result<&'e Order, UnknownOrderError> {
        engine.order(order_id).ok_or_else(|| {
            warn!(order_id = %order_id, "Command references unknown order");
            UnknownOrderError { order_id }
        })
    }

    fn schedule(&mut self, kind: ActionKind, order_id: OrderId, now: Timestamp) {
        let effective_time = self.latency.delay(now, LatencyKind::OrderAction);
        debug!(order_id = %order_id, kind = ?kind, submitted_at = now, effective_time, "Action scheduled");
        self.queue.push(kind, order_id, now, effective_time);
    }

    /// Effective time of the next pending action
    pub fn next_effective_time(&self) -> Option<Timestamp> {
        self.queue.peek_time()
    }

    pub fn pop_action(&mut self) -> Option<Action> {
        self.queue.pop()
    }

    pub fn pending_actions(&self) -> usize {
        self.queue.len()
    }
}
