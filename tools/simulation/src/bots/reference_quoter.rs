//! Reference quoter: quotes one instrument around a reference midprice
//!
//! Two custom feeds carry `midprice` and `spread` fields: a reference feed
//! (another venue) and the quoted instrument's own feed. The quoted feed
//! sets the offset between the two venues; the reference feed drives
//! quoting. When the reference moves by more than `sensitivity` the bot
//! replaces both quotes; when the reference looks broken it pulls them.

use matching_engine::Fill;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use types::ids::{InstrumentId, OrderId};
use types::order::{Order, OrderType, Side};
use types::update::CustomUpdate;

use crate::strategy::{Strategy, StrategyContext};

/// Configuration for the reference quoter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceQuoterConfig {
    /// Instrument the quotes are placed on
    pub instrument: InstrumentId,
    /// Custom-update key of the reference feed
    pub reference_key: String,
    /// Custom-update key of the quoted instrument's own feed
    pub quoted_key: String,
    /// Full quote width as a fraction of the reference price
    pub spread: f64,
    /// Reference move that triggers a re-quote
    pub sensitivity: f64,
    pub quote_size: f64,
    /// A feed below this midprice is considered broken
    pub min_midprice: f64,
    /// A feed wider than this is considered broken
    pub max_feed_spread: f64,
}

impl Default for ReferenceQuoterConfig {
    fn default() -> Self {
        Self {
            instrument: InstrumentId::new("THE"),
            reference_key: "TTF_midprice".to_string(),
            quoted_key: "THE_midprice".to_string(),
            spread: 0.01,
            sensitivity: 0.05,
            quote_size: 5.0,
            min_midprice: 0.01,
            max_feed_spread: 0.3,
        }
    }
}

/// Reference quoter state.
pub struct ReferenceQuoter {
    pub config: ReferenceQuoterConfig,
    /// Net filled quantity (positive = long)
    pub position: Decimal,
    pub quotes_sent: usize,
    pub rejected: usize,
    last_reference: f64,
    offset: Option<f64>,
    bid: Option<OrderId>,
    ask: Option<OrderId>,
}

impl ReferenceQuoter {
    pub fn new(config: ReferenceQuoterConfig) -> Self {
        Self {
            config,
            position: Decimal::ZERO,
            quotes_sent: 0,
            rejected: 0,
            last_reference: 0.0,
            offset: None,
            bid: None,
            ask: None,
        }
    }

    fn healthy(&self, midprice: f64, spread: f64) -> bool {
        midprice >= self.config.min_midprice && spread <= self.config.max_feed_spread
    }

    /// Bid and ask prices around the reference shifted by the venue offset
    pub fn quote_prices(&self) -> Option<(f64, f64)> {
        let offset = self.offset.filter(|o| *o != 0.0)?;
        let center = self.last_reference + offset;
        let half_width = self.last_reference * self.config.spread / 2.0;
        Some((center - half_width, center + half_width))
    }

    /// Current quote ids (bid, ask)
    pub fn quotes(&self) -> (Option<OrderId>, Option<OrderId>) {
        (self.bid, self.ask)
    }

    fn remove_quotes(&mut self, ctx: &mut StrategyContext<'_>) {
        for id in [self.bid.take(), self.ask.take()].into_iter().flatten() {
            // Cancels of already-terminal quotes are ignored by the book
            if let Err(err) = ctx.cancel_order(id) {
                warn!(order_id = %id, error = %err, "Quote cancel rejected");
                self.rejected += 1;
            }
        }
    }

    fn replace_quotes(&mut self, ctx: &mut StrategyContext<'_>) {
        self.remove_quotes(ctx);
        let Some((bid_price, ask_price)) = self.quote_prices() else {
            return;
        };

        self.bid = self.send_quote(ctx, bid_price, Side::Buy);
        self.ask = self.send_quote(ctx, ask_price, Side::Sell);
        debug!(bid = bid_price, ask = ask_price, at = ctx.now(), "Quotes replaced");
    }

    fn send_quote(&mut self, ctx: &mut StrategyContext<'_>, price: f64, side: Side) -> Option<OrderId> {
        match ctx.send_order(
            self.config.instrument.clone(),
            price,
            self.config.quote_size,
            side,
            OrderType::Limit,
        ) {
            Ok(id) => {
                self.quotes_sent += 1;
                Some(id)
            }
            Err(_) => {
                self.rejected += 1;
                None
            }
        }
    }
}

impl Strategy for ReferenceQuoter {
    fn on_custom_update(&mut self, ctx: &mut StrategyContext<'_>, update: &CustomUpdate) {
        let (Some(midprice), Some(spread)) = (update.payload.field("midprice"), update.payload.field("spread")) else {
            return;
        };

        if update.key == self.config.reference_key {
            if !self.healthy(midprice, spread) {
                self.remove_quotes(ctx);
            } else if (midprice - self.last_reference).abs() > self.config.sensitivity {
                self.last_reference = midprice;
                self.replace_quotes(ctx);
            }
        } else if update.key == self.config.quoted_key && self.healthy(midprice, spread) {
            self.offset = Some(midprice - self.last_reference);
        }
    }

    fn on_order_filled(&mut self, _ctx: &mut StrategyContext<'_>, order: &Order, fill: &Fill) {
        match order.side {
            Side::Buy => self.position += fill.quantity.as_decimal(),
            Side::Sell => self.position -= fill.quantity.as_decimal(),
        }
    }
}
