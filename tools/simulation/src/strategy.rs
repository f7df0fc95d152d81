//! Strategy adapter boundary
//!
//! A strategy implements `Strategy` and reacts to callbacks. Every hook gets a
//! `StrategyContext` through which it may issue commands; commands only
//! schedule actions for a later dispatch step, so nothing a hook does can
//! change the book while the hook is running.

use matching_engine::{Fill, MatchingEngine};
use types::errors::CommandError;
use types::ids::{InstrumentId, OrderId};
use types::order::{FilledOrderReport, Order, OrderType, Side};
use types::trade::MarketTrade;
use types::update::{CustomUpdate, QuoteUpdate};
use types::{Timedelta, Timestamp};

use crate::latency::LatencyKind;
use crate::router::OrderRouter;

/// Callback set supplied by the strategy author. Every hook defaults to a no-op.
pub trait Strategy {
    /// A market trade became visible
    fn on_trade(&mut self, _ctx: &mut StrategyContext<'_>, _trade: &MarketTrade) {}

    /// A custom update became visible
    fn on_custom_update(&mut self, _ctx: &mut StrategyContext<'_>, _update: &CustomUpdate) {}

    /// A top-of-book quote became visible
    fn on_quote(&mut self, _ctx: &mut StrategyContext<'_>, _quote: &QuoteUpdate) {}

    /// A Send took effect; the order is live
    fn on_new_order(&mut self, _ctx: &mut StrategyContext<'_>, _order: &Order) {}

    /// The order executed `fill.quantity` at `fill.price`
    fn on_order_filled(&mut self, _ctx: &mut StrategyContext<'_>, _order: &Order, _fill: &Fill) {}

    fn on_order_canceled(&mut self, _ctx: &mut StrategyContext<'_>, _order: &Order) {}

    fn on_order_modified(&mut self, _ctx: &mut StrategyContext<'_>, _order: &Order) {}
}

impl<S: Strategy + ?Sized> Strategy for Box<S> {
    fn on_trade(&mut self, ctx: &mut StrategyContext<'_>, trade: &MarketTrade) {
        (**self).on_trade(ctx, trade)
    }

    fn on_custom_update(&mut self, ctx: &mut StrategyContext<'_>, update: &CustomUpdate) {
        (**self).on_custom_update(ctx, update)
    }

    fn on_quote(&mut self, ctx: &mut StrategyContext<'_>, quote: &QuoteUpdate) {
        (**self).on_quote(ctx, quote)
    }

    fn on_new_order(&mut self, ctx: &mut StrategyContext<'_>, order: &Order) {
        (**self).on_new_order(ctx, order)
    }

    fn on_order_filled(&mut self, ctx: &mut StrategyContext<'_>, order: &Order, fill: &Fill) {
        (**self).on_order_filled(ctx, order, fill)
    }

    fn on_order_canceled(&mut self, ctx: &mut StrategyContext<'_>, order: &Order) {
        (**self).on_order_canceled(ctx, order)
    }

    fn on_order_modified(&mut self, ctx: &mut StrategyContext<'_>, order: &Order) {
        (**self).on_order_modified(ctx, order)
    }
}

/// What a strategy may see and do from inside a callback
pub struct StrategyContext<'a> {
    now: Timestamp,
    router: &'a mut OrderRouter,
    engine: &'a mut MatchingEngine,
}

impl<'a> StrategyContext<'a> {
    pub(crate) fn new(now: Timestamp, router: &'a mut OrderRouter, engine: &'a mut MatchingEngine) -> Self {
        Self { now, router, engine }
    }

    /// Simulated time of the callback
    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Submit an order. It goes live after the execution latency.
    ///
    /// `price` is ignored for market orders but must still be finite.
    pub fn send_order(
        &mut self,
        instrument: impl Into<InstrumentId>,
        price: f64,
        quantity: f64,
        side: Side,
        order_type: OrderType,
    ) -> Result<OrderId, CommandError> {
        self.router.send_order(
            self.engine,
            self.now,
            instrument.into(),
            price,
            quantity,
            side,
            order_type,
        )
    }

    /// Request cancellation. A target that is terminal by then is left alone.
    pub fn cancel_order(&mut self, order_id: OrderId) -> Result<(), CommandError> {
        self.router.cancel_order(self.engine, self.now, order_id)
    }

    /// Request a price/quantity replacement keeping time priority
    pub fn modify_order(&mut self, order_id: OrderId, price: f64, quantity: f64) -> Result<(), CommandError> {
        self.router.modify_order(self.engine, self.now, order_id, price, quantity)
    }

    /// Read-only view of an order issued in this run
    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        self.engine.order(order_id)
    }

    /// Filled orders so far, in creation order
    pub fn filled_orders(&self) -> Vec<FilledOrderReport> {
        self.engine.filled_orders()
    }

    pub fn latency(&self, kind: LatencyKind) -> Timedelta {
        self.router.latency().latency(kind)
    }
}

/// A strategy that never trades
#[derive(Debug, Default, Clone, Copy)]
pub struct Idle;

impl Strategy for Idle {}
