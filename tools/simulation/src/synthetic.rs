//! Seeded synthetic market data
//!
//! Generates a random-walk trade tape for smoke runs and load tests. The same
//! seed always yields the same tape.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::ids::InstrumentId;
use types::numeric::{Price, Quantity};
use types::order::Side;
use types::trade::MarketTrade;
use types::{Timedelta, Timestamp};

/// Shape of a generated tape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapeConfig {
    pub instrument: InstrumentId,
    pub start_time: Timestamp,
    /// Time between consecutive trades
    pub interval: Timedelta,
    pub start_price: Decimal,
    /// Largest per-trade move in basis points
    pub max_move_bps: u32,
    /// Trade sizes are whole units in `1..=max_quantity`
    pub max_quantity: u64,
}

impl Default for TapeConfig {
    fn default() -> Self {
        Self {
            instrument: InstrumentId::new("SYN"),
            start_time: 0,
            interval: 1_000_000,
            start_price: Decimal::from(100),
            max_move_bps: 20,
            max_quantity: 5,
        }
    }
}

/// Deterministic random-walk trade generator
pub struct SyntheticTape {
    config: TapeConfig,
    rng: ChaCha8Rng,
}

impl SyntheticTape {
    pub fn new(config: TapeConfig, seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Generate `count` time-ordered trades
    pub fn generate(&mut self, count: usize) -> Vec<MarketTrade> {
        let floor = Decimal::new(1, 2);
        let max_bps = i64::from(self.config.max_move_bps);
        let mut price = self.config.start_price.max(floor);
        let mut trades = Vec::with_capacity(count);

        for i in 0..count {
            let bps = self.rng.gen_range(-max_bps..=max_bps);
            price = (price + price * Decimal::new(bps, 4)).round_dp(2).max(floor);

            let quantity = self.rng.gen_range(1..=self.config.max_quantity.max(1));
            let side = if self.rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
            let timestamp = self
                .config
                .start_time
                .saturating_add(self.config.interval.saturating_mul(i as i64));

            trades.push(MarketTrade::new(
                timestamp,
                self.config.instrument.clone(),
                Price::new(price),
                Quantity::from_u64(quantity),
                side,
            ));
        }
        trades
    }
}
