//! Matching engine core
//!
//! Owns every order the strategy ever issued (pending, live and terminal) and
//! the per-instrument books of live ones. The simulation drives it with
//! already latency-adjusted times; the engine never looks at a clock.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;
use types::errors::{TransitionError, UnknownOrderError};
use types::ids::{InstrumentId, OrderId};
use types::numeric::{Price, Quantity};
use types::order::{FilledOrderReport, Order, OrderType, Side};
use types::trade::MarketTrade;
use types::Timestamp;

use crate::book::{AskBook, BidBook, QueuePriority};
use crate::events::{ExecutionEvent, FillSource, IgnoreReason};
use crate::matching::{MatchError, MatchExecutor, TradeResidual};

/// Main matching engine
#[derive(Debug)]
pub struct MatchingEngine {
    /// Order books per instrument
    books: BTreeMap<InstrumentId, OrderBook>,
    /// Every order ever registered, by id (= creation order)
    orders: BTreeMap<OrderId, Order>,
    /// Unconsumed liquidity of the latest trade per instrument
    residuals: BTreeMap<InstrumentId, TradeResidual>,
    /// Fill generation with sequence numbers
    executor: MatchExecutor,
    accept_sequence: u64,
    next_order_id: OrderId,
}

/// Order book for a single instrument
#[derive(Debug, Default)]
struct OrderBook {
    bids: BidBook,
    asks: AskBook,
}

impl OrderBook {
    fn insert(&mut self, order: &Order, priority: QueuePriority) {
        match order.side {
            Side::Buy => self.bids.insert(order, priority),
            Side::Sell => self.asks.insert(order, priority),
        }
    }

    fn remove(&mut self, order: &Order) -> Option<(QueuePriority, Quantity)> {
        match order.side {
            Side::Buy => self.bids.remove(order),
            Side::Sell => self.asks.remove(order),
        }
    }

    fn update_quantity(&mut self, order: &Order, quantity: Quantity) -> bool {
        match order.side {
            Side::Buy => self.bids.update_quantity(order, quantity),
            Side::Sell => self.asks.update_quantity(order, quantity),
        }
    }
}

impl MatchingEngine {
    pub fn new() -> Self {
        Self {
            books: BTreeMap::new(),
            orders: BTreeMap::new(),
            residuals: BTreeMap::new(),
            executor: MatchExecutor::default(),
            accept_sequence: 0,
            next_order_id: OrderId::new(1),
        }
    }

    /// Create an order in `PendingNew` under the next sequential id
    pub fn create_order(
        &mut self,
        instrument: InstrumentId,
        side: Side,
        order_type: OrderType,
        price: Price,
        quantity: Quantity,
        submitted_at: Timestamp,
    ) -> OrderId {
        let order_id = self.next_order_id;
        self.next_order_id = order_id.next();
        let order = Order::new(order_id, instrument, side, order_type, price, quantity, submitted_at);
        self.orders.insert(order_id, order);
        order_id
    }

    /// A Send action takes effect at `now`.
    ///
    /// Emits `Accepted`, then at most one `Filled` if same-instant trade
    /// liquidity is still available. Whatever remains rests in the book.
    pub fn accept_order(&mut self, order_id: OrderId, now: Timestamp) -> Result<Vec<ExecutionEvent>, EngineError> {
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or(UnknownOrderError { order_id })?;
        order.accept(now)?;

        let mut events = vec![ExecutionEvent::Accepted { order: order.clone() }];
        Self::cross_on_entry(&mut self.residuals, &mut self.executor, order, now, &mut events)?;

        if !order.state.is_terminal() {
            let priority = QueuePriority {
                created_at: now,
                sequence: self.accept_sequence,
            };
            self.accept_sequence += 1;
            self.books
                .entry(order.instrument.clone())
                .or_default()
                .insert(order, priority);
        }

        debug!(order_id = %order_id, state = %order.state, at = now, "Order live");
        Ok(events)
    }

    /// A market trade reaches the book at `now`.
    ///
    /// Allocates the trade quantity to resting orders on the passive side
    /// (market orders, then best price, then earliest creation) and keeps the
    /// rest as same-instant residual liquidity.
    pub fn process_trade(&mut self, trade: &MarketTrade, now: Timestamp) -> Result<Vec<ExecutionEvent>, EngineError> {
        let (allocations, left) = match self.books.get_mut(&trade.instrument) {
            Some(book) => match trade.aggressor_side {
                Side::Buy => book.asks.allocate(trade.price, trade.quantity),
                Side::Sell => book.bids.allocate(trade.price, trade.quantity),
            },
            None => (Vec::new(), trade.quantity),
        };

        let mut events = Vec::with_capacity(allocations.len());
        for allocation in allocations {
            let order = self
                .orders
                .get_mut(&allocation.order_id)
                .ok_or(UnknownOrderError { order_id: allocation.order_id })?;
            let fill = self.executor.execute_fill(
                order,
                allocation.quantity,
                trade.price,
                now,
                FillSource::RestingOrder,
            )?;
            debug!(
                order_id = %fill.order_id,
                quantity = %fill.quantity,
                price = %fill.price,
                at = now,
                "Order filled"
            );
            events.push(ExecutionEvent::Filled {
                fill,
                order: order.clone(),
            });
        }

        self.residuals
            .insert(trade.instrument.clone(), TradeResidual::new(trade, now, left));
        Ok(events)
    }

    /// A Cancel action takes effect at `now`
    pub fn cancel_order(&mut self, order_id: OrderId, now: Timestamp) -> Result<ExecutionEvent, EngineError> {
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or(UnknownOrderError { order_id })?;

        if order.state.is_terminal() {
            return Ok(ExecutionEvent::Ignored {
                order_id,
                reason: IgnoreReason::TerminalOrder,
            });
        }

        if let Some(book) = self.books.get_mut(&order.instrument) {
            book.remove(order);
        }
        order.cancel(now)?;

        debug!(order_id = %order_id, at = now, "Order canceled");
        Ok(ExecutionEvent::Canceled { order: order.clone() })
    }

    /// A Modify action takes effect at `now`.
    ///
    /// Price is ignored for market orders. Time priority is kept; a price
    /// change moves the order to its new level at its original position.
    pub fn modify_order(
        &mut self,
        order_id: OrderId,
        price: Price,
        quantity: Quantity,
        now: Timestamp,
    ) -> Result<Vec<ExecutionEvent>, EngineError> {
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or(UnknownOrderError { order_id })?;

        if order.state.is_terminal() {
            return Ok(vec![ExecutionEvent::Ignored {
                order_id,
                reason: IgnoreReason::TerminalOrder,
            }]);
        }
        if quantity <= order.filled_quantity {
            return Ok(vec![ExecutionEvent::Ignored {
                order_id,
                reason: IgnoreReason::QuantityBelowFilled,
            }]);
        }

        let price = match order.order_type {
            OrderType::Market => order.price,
            OrderType::Limit => price,
        };
        let book = self.books.entry(order.instrument.clone()).or_default();

        if price == order.price {
            order.modify(price, quantity, now)?;
            if !book.update_quantity(order, order.remaining_quantity()) {
                return Err(EngineError::NotResting(order_id));
            }
            // Same price: this order already saw the current instant's trades
            debug!(order_id = %order_id, quantity = %quantity, at = now, "Order modified in place");
            return Ok(vec![ExecutionEvent::Modified { order: order.clone() }]);
        }

        let (priority, _) = book.remove(order).ok_or(EngineError::NotResting(order_id))?;
        order.modify(price, quantity, now)?;

        let mut events = vec![ExecutionEvent::Modified { order: order.clone() }];
        Self::cross_on_entry(&mut self.residuals, &mut self.executor, order, now, &mut events)?;
        if !order.state.is_terminal() {
            book.insert(order, priority);
        }

        debug!(order_id = %order_id, price = %price, quantity = %quantity, at = now, "Order repriced");
        Ok(events)
    }

    /// Fill `order` against same-instant residual liquidity, if any
    fn cross_on_entry(
        residuals: &mut BTreeMap<InstrumentId, TradeResidual>,
        executor: &mut MatchExecutor,
        order: &mut Order,
        now: Timestamp,
        events: &mut Vec<ExecutionEvent>,
    ) -> Result<(), EngineError> {
        let Some(residual) = residuals.get_mut(&order.instrument) else {
            return Ok(());
        };
        if !residual.available_to(order, now) {
            return Ok(());
        }

        let take = order.remaining_quantity().min(residual.remaining);
        let fill = executor.execute_fill(order, take, residual.price, now, FillSource::CrossingOnEntry)?;
        residual.remaining = residual.remaining.saturating_sub(take);

        debug!(
            order_id = %fill.order_id,
            quantity = %fill.quantity,
            price = %fill.price,
            at = now,
            "Order crossed on entry"
        );
        events.push(ExecutionEvent::Filled {
            fill,
            order: order.clone(),
        });
        Ok(())
    }

    /// Look up any order the engine has seen
    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        self.orders.get(&order_id)
    }

    /// All orders in creation order
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    /// Orders whose terminal state is `Filled`, in creation order
    pub fn filled_orders(&self) -> Vec<FilledOrderReport> {
        self.orders.values().filter_map(Order::filled_report).collect()
    }

    /// Number of orders resting in any book
    pub fn live_order_count(&self) -> usize {
        self.books
            .values()
            .map(|book| book.bids.order_count() + book.asks.order_count())
            .sum()
    }

    /// Number of fills executed so far
    pub fn fill_count(&self) -> u64 {
        self.executor.fill_count()
    }

    /// Get order book snapshot of the strategy's own resting orders
    pub fn get_order_book(&self, instrument: &InstrumentId, depth: usize) -> Option<OrderBookSnapshot> {
        self.books.get(instrument).map(|book| OrderBookSnapshot {
            instrument: instrument.clone(),
            market_bid_quantity: book.bids.market_quantity(),
            market_ask_quantity: book.asks.market_quantity(),
            bids: book.bids.depth_snapshot(depth),
            asks: book.asks.depth_snapshot(depth),
        })
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Resting-order snapshot for inspection
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBookSnapshot {
    pub instrument: InstrumentId,
    pub market_bid_quantity: Quantity,
    pub market_ask_quantity: Quantity,
    pub bids: Vec<(Price, Quantity)>,
    pub asks: Vec<(Price, Quantity)>,
}

/// Engine errors
///
/// These signal a caller driving the engine out of order; a correctly
/// sequenced simulation never produces them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    UnknownOrder(#[from] UnknownOrderError),

    #[error("Order {0} is live but not resting in its book")]
    NotResting(OrderId),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Match(#[from] MatchError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::order::OrderState;

    fn qty(s: &str) -> Quantity {
        s.parse().unwrap()
    }

    fn trade(aggressor: Side, price: u64, quantity: &str) -> MarketTrade {
        MarketTrade::new(0, "X", Price::from_u64(price), qty(quantity), aggressor)
    }

    /// Create an order on "X" and let it go live at `now`
    fn live(
        engine: &mut MatchingEngine,
        side: Side,
        order_type: OrderType,
        price: u64,
        quantity: &str,
        now: Timestamp,
    ) -> (OrderId, Vec<ExecutionEvent>) {
        let id = engine.create_order(
            InstrumentId::new("X"),
            side,
            order_type,
            Price::from_u64(price),
            qty(quantity),
            now,
        );
        let events = engine.accept_order(id, now).unwrap();
        (id, events)
    }

    #[test]
    fn test_create_order_is_pending() {
        let mut engine = MatchingEngine::new();
        let first = engine.create_order(InstrumentId::new("X"), Side::Buy, OrderType::Market, Price::zero(), qty("1"), 3);
        let second = engine.create_order(InstrumentId::new("X"), Side::Buy, OrderType::Market, Price::zero(), qty("1"), 3);

        assert_eq!(first, OrderId::new(1));
        assert_eq!(second, OrderId::new(2));
        assert_eq!(engine.order(first).unwrap().state, OrderState::PendingNew);
        assert_eq!(engine.live_order_count(), 0);
    }

    #[test]
    fn test_engine_resting_order() {
        let mut engine = MatchingEngine::new();
        let (id, events) = live(&mut engine, Side::Buy, OrderType::Limit, 100, "1", 1);

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ExecutionEvent::Accepted { .. }));
        assert_eq!(engine.live_order_count(), 1);
        assert_eq!(engine.order(id).unwrap().create_timestamp, Some(1));
    }

    #[test]
    fn test_accept_twice_is_an_error() {
        let mut engine = MatchingEngine::new();
        let (id, _) = live(&mut engine, Side::Buy, OrderType::Limit, 100, "1", 1);
        assert!(matches!(engine.accept_order(id, 2), Err(EngineError::Transition(_))));
    }

    #[test]
    fn test_trade_fills_resting_market_order() {
        let mut engine = MatchingEngine::new();
        live(&mut engine, Side::Sell, OrderType::Market, 0, "1", 1);

        let events = engine.process_trade(&trade(Side::Buy, 100, "1"), 2).unwrap();
        assert_eq!(events.len(), 1);
        match &events[0] {
            ExecutionEvent::Filled { fill, order } => {
                assert_eq!(fill.price, Price::from_u64(100));
                assert_eq!(fill.source, FillSource::RestingOrder);
                assert_eq!(order.state, OrderState::Filled);
            }
            other => panic!("Expected Filled, got {other:?}"),
        }
        assert_eq!(engine.live_order_count(), 0);
        assert_eq!(engine.filled_orders().len(), 1);
        assert_eq!(engine.fill_count(), 1);
    }

    #[test]
    fn test_same_side_trade_does_not_fill() {
        let mut engine = MatchingEngine::new();
        live(&mut engine, Side::Sell, OrderType::Market, 0, "1", 1);

        let events = engine.process_trade(&trade(Side::Sell, 100, "1"), 2).unwrap();
        assert!(events.is_empty());
        assert_eq!(engine.live_order_count(), 1);
    }

    #[test]
    fn test_partial_fill_across_trades() {
        let mut engine = MatchingEngine::new();
        let (id, _) = live(&mut engine, Side::Buy, OrderType::Market, 0, "2", 0);

        engine.process_trade(&trade(Side::Sell, 100, "1"), 1).unwrap();
        let order = engine.order(id).unwrap();
        assert_eq!(order.state, OrderState::PartiallyFilled);
        assert_eq!(order.filled_quantity, qty("1"));

        engine.process_trade(&trade(Side::Sell, 101, "1"), 2).unwrap();
        let order = engine.order(id).unwrap();
        assert_eq!(order.state, OrderState::Filled);
        assert_eq!(order.last_exec_price, Price::from_u64(101));
        assert_eq!(order.last_report_timestamp, 2);
    }

    #[test]
    fn test_crossing_on_entry_uses_same_instant_residual() {
        let mut engine = MatchingEngine::new();
        engine.process_trade(&trade(Side::Buy, 100, "1"), 1).unwrap();

        let (_, events) = live(&mut engine, Side::Sell, OrderType::Market, 0, "1", 1);
        assert_eq!(events.len(), 2);
        match &events[1] {
            ExecutionEvent::Filled { fill, order } => {
                assert_eq!(fill.source, FillSource::CrossingOnEntry);
                assert_eq!(fill.price, Price::from_u64(100));
                assert_eq!(order.state, OrderState::Filled);
            }
            other => panic!("Expected Filled, got {other:?}"),
        }
        assert_eq!(engine.live_order_count(), 0);
    }

    #[test]
    fn test_crossing_respects_limit_price() {
        let mut engine = MatchingEngine::new();
        engine.process_trade(&trade(Side::Buy, 100, "1"), 1).unwrap();

        let (_, events) = live(&mut engine, Side::Sell, OrderType::Limit, 101, "1", 1);
        assert_eq!(events.len(), 1);
        let (_, events) = live(&mut engine, Side::Sell, OrderType::Limit, 100, "1", 1);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_residual_is_not_reused() {
        let mut engine = MatchingEngine::new();
        engine.process_trade(&trade(Side::Buy, 100, "1"), 1).unwrap();

        live(&mut engine, Side::Sell, OrderType::Market, 0, "1", 1);
        let (_, events) = live(&mut engine, Side::Sell, OrderType::Market, 0, "1", 1);
        assert_eq!(events.len(), 1);

        // A later instant never sees the old print
        let (_, events) = live(&mut engine, Side::Sell, OrderType::Market, 0, "1", 2);
        assert_eq!(events.len(), 1);
        assert_eq!(engine.live_order_count(), 2);
    }

    #[test]
    fn test_consumed_trade_leaves_no_residual() {
        let mut engine = MatchingEngine::new();
        live(&mut engine, Side::Sell, OrderType::Market, 0, "1", 0);
        engine.process_trade(&trade(Side::Buy, 100, "1"), 1).unwrap();

        let (_, events) = live(&mut engine, Side::Sell, OrderType::Market, 0, "1", 1);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_cancel_and_idempotent_cancel() {
        let mut engine = MatchingEngine::new();
        let (id, _) = live(&mut engine, Side::Buy, OrderType::Limit, 99, "1", 0);

        let event = engine.cancel_order(id, 3).unwrap();
        assert!(matches!(event, ExecutionEvent::Canceled { .. }));
        assert_eq!(engine.live_order_count(), 0);

        let event = engine.cancel_order(id, 4).unwrap();
        assert_eq!(
            event,
            ExecutionEvent::Ignored {
                order_id: id,
                reason: IgnoreReason::TerminalOrder,
            }
        );
        assert_eq!(engine.order(id).unwrap().last_report_timestamp, 3);
    }

    #[test]
    fn test_unknown_order() {
        let mut engine = MatchingEngine::new();
        let err = engine.cancel_order(OrderId::new(42), 0).unwrap_err();
        assert!(matches!(err, EngineError::UnknownOrder(_)));
    }

    #[test]
    fn test_modify_keeps_time_priority() {
        let mut engine = MatchingEngine::new();
        let (first, _) = live(&mut engine, Side::Buy, OrderType::Limit, 99, "1", 0);
        live(&mut engine, Side::Buy, OrderType::Limit, 100, "1", 1);

        // The first order joins the second's level but is older
        let events = engine.modify_order(first, Price::from_u64(100), qty("1"), 2).unwrap();
        assert!(matches!(events[0], ExecutionEvent::Modified { .. }));

        let events = engine.process_trade(&trade(Side::Sell, 100, "1"), 3).unwrap();
        assert_eq!(events[0].order_id(), first);
        assert_eq!(engine.order(first).unwrap().create_timestamp, Some(0));
    }

    #[test]
    fn test_repriced_modify_crosses_same_instant_trade() {
        let mut engine = MatchingEngine::new();
        let (id, _) = live(&mut engine, Side::Buy, OrderType::Limit, 99, "1", 0);

        // Printed above the limit: nothing fills, the print stays available at t=5
        let events = engine.process_trade(&trade(Side::Sell, 100, "2"), 5).unwrap();
        assert!(events.is_empty());

        let events = engine.modify_order(id, Price::from_u64(100), qty("1"), 5).unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ExecutionEvent::Modified { .. }));
        match &events[1] {
            ExecutionEvent::Filled { fill, order } => {
                assert_eq!(fill.source, FillSource::CrossingOnEntry);
                assert_eq!(fill.price, Price::from_u64(100));
                assert_eq!(order.state, OrderState::Filled);
            }
            other => panic!("expected a fill, got {other:?}"),
        }
        assert_eq!(engine.live_order_count(), 0);
    }

    #[test]
    fn test_repriced_modify_ignores_earlier_trade() {
        let mut engine = MatchingEngine::new();
        let (id, _) = live(&mut engine, Side::Buy, OrderType::Limit, 99, "1", 0);
        engine.process_trade(&trade(Side::Sell, 100, "2"), 5).unwrap();

        let events = engine.modify_order(id, Price::from_u64(100), qty("1"), 6).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(engine.order(id).unwrap().state, OrderState::New);
        assert_eq!(engine.live_order_count(), 1);
    }

    #[test]
    fn test_modify_quantity_in_place() {
        let mut engine = MatchingEngine::new();
        let (id, _) = live(&mut engine, Side::Buy, OrderType::Market, 0, "1", 0);
        engine.modify_order(id, Price::from_u64(5), qty("3"), 1).unwrap();

        let order = engine.order(id).unwrap();
        assert_eq!(order.price, Price::zero());
        let snapshot = engine.get_order_book(&InstrumentId::new("X"), 5).unwrap();
        assert_eq!(snapshot.market_bid_quantity, qty("3"));
    }

    #[test]
    fn test_modify_below_filled_is_ignored() {
        let mut engine = MatchingEngine::new();
        let (id, _) = live(&mut engine, Side::Buy, OrderType::Market, 0, "2", 0);
        engine.process_trade(&trade(Side::Sell, 100, "1"), 1).unwrap();

        let events = engine.modify_order(id, Price::zero(), qty("1"), 2).unwrap();
        assert_eq!(
            events,
            vec![ExecutionEvent::Ignored {
                order_id: id,
                reason: IgnoreReason::QuantityBelowFilled,
            }]
        );
    }

    #[test]
    fn test_filled_orders_in_creation_order() {
        let mut engine = MatchingEngine::new();
        let (limit, _) = live(&mut engine, Side::Buy, OrderType::Limit, 101, "1", 0);
        let (market, _) = live(&mut engine, Side::Buy, OrderType::Market, 0, "1", 1);

        // Market order fills first, but reports follow creation order
        let events = engine.process_trade(&trade(Side::Sell, 100, "2"), 2).unwrap();
        assert_eq!(events[0].order_id(), market);

        let ids: Vec<OrderId> = engine.filled_orders().iter().map(|r| r.order_id).collect();
        assert_eq!(ids, vec![limit, market]);
    }
}
