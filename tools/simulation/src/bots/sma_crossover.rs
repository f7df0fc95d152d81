//! SMA crossover bot: trend following on trade prices
//!
//! Keeps a short and a long simple moving average of one instrument's trade
//! prices. When the short average crosses above the long one it buys, when it
//! crosses below it sells, always with market orders and never beyond a
//! position limit.

use std::collections::VecDeque;

use matching_engine::Fill;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use types::ids::{InstrumentId, OrderId};
use types::order::{Order, OrderType, Side};
use types::trade::MarketTrade;

use crate::strategy::{Strategy, StrategyContext};

/// Configuration for the crossover bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmaCrossoverConfig {
    pub instrument: InstrumentId,
    pub short_window: usize,
    pub long_window: usize,
    /// Size of each market order
    pub order_quantity: f64,
    /// Largest absolute position the bot will build
    pub max_position: Decimal,
}

impl Default for SmaCrossoverConfig {
    fn default() -> Self {
        Self {
            instrument: InstrumentId::new("SYN"),
            short_window: 5,
            long_window: 20,
            order_quantity: 1.0,
            max_position: Decimal::from(5),
        }
    }
}

/// Fixed-size window with a running sum
#[derive(Debug, Clone)]
struct MovingAverage {
    window: usize,
    values: VecDeque<Decimal>,
    sum: Decimal,
}

impl MovingAverage {
    fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            values: VecDeque::with_capacity(window.max(1)),
            sum: Decimal::ZERO,
        }
    }

    fn push(&mut self, value: Decimal) {
        if self.values.len() == self.window {
            if let Some(oldest) = self.values.pop_front() {
                self.sum -= oldest;
            }
        }
        self.values.push_back(value);
        self.sum += value;
    }

    /// Mean once the window is full
    fn value(&self) -> Option<Decimal> {
        (self.values.len() == self.window).then(|| self.sum / Decimal::from(self.window as u64))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trend {
    Up,
    Down,
}

/// Crossover bot state.
pub struct SmaCrossover {
    pub config: SmaCrossoverConfig,
    pub position: Decimal,
    pub orders_sent: usize,
    pub rejected: usize,
    short: MovingAverage,
    long: MovingAverage,
    trend: Option<Trend>,
    working: Option<OrderId>,
}

impl SmaCrossover {
    pub fn new(config: SmaCrossoverConfig) -> Self {
        Self {
            short: MovingAverage::new(config.short_window),
            long: MovingAverage::new(config.long_window),
            config,
            position: Decimal::ZERO,
            orders_sent: 0,
            rejected: 0,
            trend: None,
            working: None,
        }
    }

    /// Feed one price; returns the side to trade if the averages just crossed
    fn observe(&mut self, price: Decimal) -> Option<Side> {
        self.short.push(price);
        self.long.push(price);

        let (short, long) = (self.short.value()?, self.long.value()?);
        let trend = match short.cmp(&long) {
            std::cmp::Ordering::Greater => Trend::Up,
            std::cmp::Ordering::Less => Trend::Down,
            std::cmp::Ordering::Equal => return None,
        };

        let previous = self.trend.replace(trend);
        match (previous, trend) {
            (Some(Trend::Down), Trend::Up) => Some(Side::Buy),
            (Some(Trend::Up), Trend::Down) => Some(Side::Sell),
            _ => None,
        }
    }

    /// Whether another order of `side` stays within the position limit
    fn within_limit(&self, side: Side) -> bool {
        let step = Decimal::try_from(self.config.order_quantity).unwrap_or(Decimal::ZERO);
        match side {
            Side::Buy => self.position + step <= self.config.max_position,
            Side::Sell => self.position - step >= -self.config.max_position,
        }
    }
}

impl Strategy for SmaCrossover {
    fn on_trade(&mut self, ctx: &mut StrategyContext<'_>, trade: &MarketTrade) {
        if trade.instrument != self.config.instrument {
            return;
        }
        let Some(side) = self.observe(trade.price.as_decimal()) else {
            return;
        };

        // One working order at a time
        if let Some(id) = self.working {
            if ctx.order(id).is_some_and(|order| !order.state.is_terminal()) {
                return;
            }
        }
        if !self.within_limit(side) {
            return;
        }

        match ctx.send_order(
            self.config.instrument.clone(),
            0.0,
            self.config.order_quantity,
            side,
            OrderType::Market,
        ) {
            Ok(id) => {
                debug!(order_id = %id, side = %side, at = ctx.now(), "Crossover order sent");
                self.working = Some(id);
                self.orders_sent += 1;
            }
            Err(_) => self.rejected += 1,
        }
    }

    fn on_order_filled(&mut self, _ctx: &mut StrategyContext<'_>, order: &Order, fill: &Fill) {
        match order.side {
            Side::Buy => self.position += fill.quantity.as_decimal(),
            Side::Sell => self.position -= fill.quantity.as_decimal(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Simulation;
    use types::numeric::{Price, Quantity};

    fn config(short: usize, long: usize) -> SmaCrossoverConfig {
        SmaCrossoverConfig {
            instrument: InstrumentId::new("X"),
            short_window: short,
            long_window: long,
            ..Default::default()
        }
    }

    #[test]
    fn test_moving_average() {
        let mut ma = MovingAverage::new(3);
        ma.push(Decimal::from(1));
        ma.push(Decimal::from(2));
        assert_eq!(ma.value(), None);
        ma.push(Decimal::from(3));
        assert_eq!(ma.value(), Some(Decimal::from(2)));
        ma.push(Decimal::from(7));
        assert_eq!(ma.value(), Some(Decimal::from(4)));
    }

    #[test]
    fn test_crossover_signals() {
        let mut bot = SmaCrossover::new(config(1, 3));
        let signals: Vec<Option<Side>> = [10, 9, 8, 7, 12, 11, 5]
            .into_iter()
            .map(|p| bot.observe(Decimal::from(p)))
            .collect();

        // Trend is first known at the third price (down), flips up at 12, down at 5
        assert_eq!(
            signals,
            vec![None, None, None, None, Some(Side::Buy), None, Some(Side::Sell)]
        );
    }

    #[test]
    fn test_position_limit() {
        let mut bot = SmaCrossover::new(SmaCrossoverConfig {
            max_position: Decimal::ONE,
            ..config(1, 2)
        });
        assert!(bot.within_limit(Side::Buy));
        bot.position = Decimal::ONE;
        assert!(!bot.within_limit(Side::Buy));
        assert!(bot.within_limit(Side::Sell));
    }

    #[test]
    fn test_trades_on_crossover_in_simulation() {
        let prices = [10, 9, 8, 7, 12, 13, 14];
        let trades: Vec<MarketTrade> = prices
            .iter()
            .enumerate()
            .map(|(i, p)| MarketTrade::new(i as i64, "X", Price::from_u64(*p), Quantity::from_u64(1), Side::Sell))
            .collect();

        let mut sim = Simulation::with_latencies(0, 0, SmaCrossover::new(config(1, 3))).unwrap();
        sim.add_trades("X", trades);
        sim.run().unwrap();

        let bot = sim.strategy();
        assert_eq!(bot.orders_sent, 1);
        // The buy goes live at t=4 and takes the leftover of the trade that triggered it
        assert_eq!(bot.position, Decimal::ONE);
        assert_eq!(sim.filled_orders()[0].exec_price, Price::from_u64(12));
    }
}
