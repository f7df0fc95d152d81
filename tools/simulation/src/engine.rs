//! Deterministic event dispatcher
//!
//! `Simulation` owns the simulated clock. Each iteration picks the globally
//! next item among the head of the market-data timeline (at its
//! market-data-latency-adjusted time) and the head of the action queue (at
//! its execution-latency-adjusted time), applies exactly that one item, then
//! delivers the resulting callbacks. An action and a market event with the
//! same effective time resolve action first.
//!
//! Every effect is recorded in a journal of `SimEvent`s; the journal's
//! SHA-256 digest identifies a run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use types::errors::SimulationError;
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::{FilledOrderReport, Order};
use types::trade::MarketTrade;
use types::update::{CustomUpdate, QuoteUpdate};
use types::Timestamp;

use market_data::{FeedIngester, FeedKind, MarketEvent};
use matching_engine::{EngineError, ExecutionEvent, FillSource, IgnoreReason, MatchingEngine};

use crate::actions::{Action, ActionKind};
use crate::config::SimulationConfig;
use crate::latency::{LatencyKind, LatencyModel};
use crate::replay::journal_digest;
use crate::router::OrderRouter;
use crate::strategy::{Strategy, StrategyContext};

/// One journal entry. `at` is the simulated time of the effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    MarketDelivered {
        at: Timestamp,
        feed: FeedKind,
        key: String,
        exchange_timestamp: Timestamp,
    },
    OrderAccepted {
        at: Timestamp,
        order_id: OrderId,
        submitted_at: Timestamp,
    },
    OrderFilled {
        at: Timestamp,
        order_id: OrderId,
        price: Price,
        quantity: Quantity,
        filled_quantity: Quantity,
        source: FillSource,
    },
    OrderCanceled {
        at: Timestamp,
        order_id: OrderId,
        filled_quantity: Quantity,
    },
    OrderModified {
        at: Timestamp,
        order_id: OrderId,
        price: Price,
        quantity: Quantity,
    },
    ActionIgnored {
        at: Timestamp,
        order_id: OrderId,
        reason: IgnoreReason,
    },
}

impl SimEvent {
    pub fn at(&self) -> Timestamp {
        match self {
            SimEvent::MarketDelivered { at, .. }
            | SimEvent::OrderAccepted { at, .. }
            | SimEvent::OrderFilled { at, .. }
            | SimEvent::OrderCanceled { at, .. }
            | SimEvent::OrderModified { at, .. }
            | SimEvent::ActionIgnored { at, .. } => *at,
        }
    }

    /// Order the entry concerns, if any
    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            SimEvent::MarketDelivered { .. } => None,
            SimEvent::OrderAccepted { order_id, .. }
            | SimEvent::OrderFilled { order_id, .. }
            | SimEvent::OrderCanceled { order_id, .. }
            | SimEvent::OrderModified { order_id, .. }
            | SimEvent::ActionIgnored { order_id, .. } => Some(*order_id),
        }
    }
}

/// Counters of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub market_events: u64,
    pub actions: u64,
    pub fills: u64,
    pub orders_created: usize,
    pub filled_orders: usize,
    /// Simulated time of the last dispatched item
    pub final_time: Option<Timestamp>,
    pub digest: String,
}

/// Backtest of one strategy over one set of market data
pub struct Simulation<S: Strategy> {
    config: SimulationConfig,
    latency: LatencyModel,
    ingester: FeedIngester,
    strategy: S,
    engine: MatchingEngine,
    journal: Vec<SimEvent>,
}

impl<S: Strategy> Simulation<S> {
    /// Validate the configuration and wrap the strategy
    pub fn new(config: SimulationConfig, strategy: S) -> Result<Self, SimulationError> {
        let latency = LatencyModel::try_from(&config).map_err(|err| {
            tracing::error!(error = %err, "Invalid simulation configuration");
            err
        })?;
        Ok(Self {
            config,
            latency,
            ingester: FeedIngester::new(),
            strategy,
            engine: MatchingEngine::new(),
            journal: Vec::new(),
        })
    }

    /// Shorthand for `new` with explicit latencies
    pub fn with_latencies(
        execution_latency: i64,
        market_data_latency: i64,
        strategy: S,
    ) -> Result<Self, SimulationError> {
        Self::new(SimulationConfig::new(execution_latency, market_data_latency), strategy)
    }

    /// Add (or replace) a time-ordered batch of trades
    pub fn add_trades(&mut self, key: impl Into<String>, trades: Vec<MarketTrade>) -> &mut Self {
        self.ingester.add_trades(key, trades);
        self
    }

    /// Add (or replace) a time-ordered batch of custom updates
    pub fn add_custom_updates(&mut self, key: impl Into<String>, updates: Vec<CustomUpdate>) -> &mut Self {
        self.ingester.add_custom_updates(key, updates);
        self
    }

    /// Add (or replace) a time-ordered batch of quotes
    pub fn add_quotes(&mut self, key: impl Into<String>, quotes: Vec<QuoteUpdate>) -> &mut Self {
        self.ingester.add_quotes(key, quotes);
        self
    }

    /// Add trade batches by key, in key order
    pub fn add_trade_map(&mut self, trades: BTreeMap<String, Vec<MarketTrade>>) -> &mut Self {
        self.ingester.add_trade_map(trades);
        self
    }

    /// Add custom-update batches by key, in key order
    pub fn add_custom_map(&mut self, updates: BTreeMap<String, Vec<CustomUpdate>>) -> &mut Self {
        self.ingester.add_custom_map(updates);
        self
    }

    /// Add quote batches by key, in key order
    pub fn add_quote_map(&mut self, quotes: BTreeMap<String, Vec<QuoteUpdate>>) -> &mut Self {
        self.ingester.add_quote_map(quotes);
        self
    }

    /// Drop all ingested market data
    pub fn clear_market_data(&mut self) {
        self.ingester.clear();
    }

    /// Replay all market data against the strategy until both the timeline
    /// and the action queue are exhausted.
    ///
    /// Input batches are validated first; a malformed batch aborts before any
    /// event is dispatched. Order state and the journal start fresh on every
    /// call; the strategy object is reused as is.
    pub fn run(&mut self) -> Result<RunSummary, SimulationError> {
        let mut timeline = self.ingester.commit()?;

        self.engine = MatchingEngine::new();
        self.journal.clear();
        let mut router = OrderRouter::new(self.latency);

        let Self {
            latency,
            strategy,
            engine,
            journal,
            ..
        } = self;

        info!(
            events = timeline.remaining(),
            execution_latency = latency.latency(LatencyKind::OrderAction),
            market_data_latency = latency.latency(LatencyKind::MarketDataDelivery),
            "Simulation started"
        );

        let mut summary = RunSummary::default();
        let mut now: Option<Timestamp> = None;

        loop {
            let next_market = timeline
                .peek_timestamp()
                .map(|ts| latency.delay(ts, LatencyKind::MarketDataDelivery));
            let next_action = router.next_effective_time();

            let action_first = match (next_action, next_market) {
                (None, None) => break,
                (Some(action_at), Some(market_at)) => action_at <= market_at,
                (Some(_), None) => true,
                (None, Some(_)) => false,
            };

            if action_first {
                let Some(action) = router.pop_action() else { break };
                let at = advance(&mut now, action.effective_time);
                let events = apply_action(engine, &action, at).map_err(engine_failure)?;
                summary.actions += 1;
                deliver(strategy, &mut router, engine, journal, at, events);
            } else {
                let Some(event) = timeline.next() else { break };
                let at = advance(&mut now, latency.delay(event.timestamp(), LatencyKind::MarketDataDelivery));
                summary.market_events += 1;
                journal.push(SimEvent::MarketDelivered {
                    at,
                    feed: event.feed_kind(),
                    key: event.key().to_string(),
                    exchange_timestamp: event.timestamp(),
                });
                debug!(kind = event.event_type_label(), key = event.key(), at, "Market event delivered");

                match &event {
                    MarketEvent::Trade(trade) => {
                        let events = engine.process_trade(trade, at).map_err(engine_failure)?;
                        deliver(strategy, &mut router, engine, journal, at, events);
                        strategy.on_trade(&mut StrategyContext::new(at, &mut router, engine), trade);
                    }
                    MarketEvent::Custom(update) => {
                        strategy.on_custom_update(&mut StrategyContext::new(at, &mut router, engine), update);
                    }
                    MarketEvent::Quote(quote) => {
                        strategy.on_quote(&mut StrategyContext::new(at, &mut router, engine), quote);
                    }
                }
            }
        }

        summary.fills = engine.fill_count();
        summary.orders_created = engine.orders().count();
        summary.filled_orders = engine.filled_orders().len();
        summary.final_time = now;
        summary.digest = journal_digest(journal);

        info!(
            market_events = summary.market_events,
            actions = summary.actions,
            fills = summary.fills,
            filled_orders = summary.filled_orders,
            digest = %summary.digest,
            "Simulation finished"
        );
        Ok(summary)
    }

    /// `GetFilledOrders()`: filled orders of the last run, in creation order
    pub fn filled_orders(&self) -> Vec<FilledOrderReport> {
        self.engine.filled_orders()
    }

    /// Every order of the last run, in creation order
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.engine.orders()
    }

    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        self.engine.order(order_id)
    }

    /// Journal of the last run
    pub fn journal(&self) -> &[SimEvent] {
        &self.journal
    }

    /// SHA-256 of the last run's journal
    pub fn digest(&self) -> String {
        journal_digest(&self.journal)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn latency(&self) -> &LatencyModel {
        &self.latency
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn strategy_mut(&mut self) -> &mut S {
        &mut self.strategy
    }

    pub fn into_strategy(self) -> S {
        self.strategy
    }
}

/// Move the clock to `at`; it never moves backward
fn advance(now: &mut Option<Timestamp>, at: Timestamp) -> Timestamp {
    let at = now.map_or(at, |current| current.max(at));
    *now = Some(at);
    at
}

fn apply_action(engine: &mut MatchingEngine, action: &Action, at: Timestamp) -> Result<Vec<ExecutionEvent>, EngineError> {
    debug!(order_id = %action.order_id, kind = ?action.kind, submitted_at = action.submitted_at, at, "Applying action");
    match action.kind {
        ActionKind::Send => engine.accept_order(action.order_id, at),
        ActionKind::Cancel => engine.cancel_order(action.order_id, at).map(|event| vec![event]),
        ActionKind::Modify { price, quantity } => engine.modify_order(action.order_id, price, quantity, at),
    }
}

fn engine_failure(err: EngineError) -> SimulationError {
    tracing::error!(error = %err, "Matching engine rejected a scheduled action");
    SimulationError::Engine(err.to_string())
}

/// Journal each book effect, then hand it to the strategy, in emission order
fn deliver<S: Strategy>(
    strategy: &mut S,
    router: &mut OrderRouter,
    engine: &mut MatchingEngine,
    journal: &mut Vec<SimEvent>,
    at: Timestamp,
    events: Vec<ExecutionEvent>,
) {
    for event in events {
        match event {
            ExecutionEvent::Accepted { order } => {
                journal.push(SimEvent::OrderAccepted {
                    at,
                    order_id: order.id,
                    submitted_at: order.submitted_at,
                });
                strategy.on_new_order(&mut StrategyContext::new(at, router, engine), &order);
            }
            ExecutionEvent::Filled { fill, order } => {
                journal.push(SimEvent::OrderFilled {
                    at,
                    order_id: order.id,
                    price: fill.price,
                    quantity: fill.quantity,
                    filled_quantity: order.filled_quantity,
                    source: fill.source,
                });
                strategy.on_order_filled(&mut StrategyContext::new(at, router, engine), &order, &fill);
            }
            ExecutionEvent::Canceled { order } => {
                journal.push(SimEvent::OrderCanceled {
                    at,
                    order_id: order.id,
                    filled_quantity: order.filled_quantity,
                });
                strategy.on_order_canceled(&mut StrategyContext::new(at, router, engine), &order);
            }
            ExecutionEvent::Modified { order } => {
                journal.push(SimEvent::OrderModified {
                    at,
                    order_id: order.id,
                    price: order.price,
                    quantity: order.quantity,
                });
                strategy.on_order_modified(&mut StrategyContext::new(at, router, engine), &order);
            }
            ExecutionEvent::Ignored { order_id, reason } => {
                warn!(order_id = %order_id, reason = ?reason, at, "Action ignored");
                journal.push(SimEvent::ActionIgnored { at, order_id, reason });
            }
        }
    }
}
