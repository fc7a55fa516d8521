//! Portfolio reconstruction from the tick event log.
//!
//! Everything in here is synchronous and side-effect free: the service layer
//! fetches documents, this module turns them into a ledger and summary.

pub mod action;
pub mod active_model;
pub mod fields;
pub mod ledger;
pub mod performance;
pub mod tick;

pub use action::{parse_action, ParsedAction, DEFAULT_TRADE_SIZE};
pub use active_model::{resolve_current_model, ActiveModelHistory};
pub use ledger::{assemble_ledger, Ledger, ModelLookup, Trade};
pub use performance::{
    Balances, CurrentPrices, HistoryPoint, HistorySource, Holdings, Performance,
    PerformanceSummary,
};
pub use tick::{normalize_ticks, TickBatch, TickEvent};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::UserDocument;

#[derive(Debug, Clone, Serialize)]
pub struct Portfolio {
    pub username: String,
    pub current_model: Option<String>,
    pub owned_models: Vec<String>,
    pub balances: Balances,
    pub current_prices: CurrentPrices,
    pub performance: Performance,
    /// Most recent first.
    pub trades: Vec<Trade>,
    pub total_trades: usize,
    pub performance_history: Vec<HistoryPoint>,
    pub history_source: HistorySource,
}

#[derive(Debug, Clone, Serialize)]
pub struct LatestTick {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub action: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_usd: Decimal,
    pub source_collection: Option<String>,
}

/// Diagnostics about the tick set the portfolio was built from.
#[derive(Debug, Clone, Serialize)]
pub struct TicksData {
    pub total_ticks: usize,
    pub dropped_ticks: usize,
    pub latest_tick: Option<LatestTick>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioReport {
    pub portfolio: Portfolio,
    pub ticks_data: TicksData,
}

/// Build the full portfolio view for one user.
///
/// `ticks` must already be normalized; it covers every source collection the
/// caller decided to read.
pub fn build_portfolio(
    user: &UserDocument,
    ticks: &TickBatch,
    lookup: &ModelLookup,
    default_trade_size: Decimal,
    now: DateTime<Utc>,
) -> PortfolioReport {
    let holdings = Holdings {
        usd: user.usd_balance(),
        sol: user.sol_balance(),
    };
    let summary = performance::summarize(
        &ticks.events,
        holdings,
        user.portfolio_history.as_deref(),
        now,
    );
    let ledger = assemble_ledger(&ticks.events, lookup, default_trade_size);

    let latest_tick = ticks.latest().map(|tick| LatestTick {
        id: tick.id.clone(),
        timestamp: tick.timestamp,
        action: tick.raw_action.clone(),
        price_usd: tick.price_usd,
        source_collection: tick.source_collection.clone(),
    });

    PortfolioReport {
        portfolio: Portfolio {
            username: user.username.clone(),
            current_model: resolve_current_model(&user.active_models),
            owned_models: user.owned_models.clone(),
            balances: summary.balances,
            current_prices: summary.current_prices,
            performance: summary.performance,
            trades: ledger.trades,
            total_trades: ledger.total_trades,
            performance_history: summary.performance_history,
            history_source: summary.history_source,
        },
        ticks_data: TicksData {
            total_ticks: ticks.events.len(),
            dropped_ticks: ticks.dropped,
            latest_tick,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Side, TickDocument};
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn docs(now: DateTime<Utc>) -> Vec<TickDocument> {
        let at = |minutes: i64| (now - Duration::minutes(minutes)).to_rfc3339();
        vec![
            json!({ "timestamp": at(40), "action": "WARMUP", "price_usd": 100 }),
            json!({ "timestamp": at(30), "action": "BUY 0.5", "price_usd": 101, "profit_loss_usd": 10 }),
            json!({ "timestamp": at(20), "action": "HOLD", "price_usd": 102 }),
            json!({ "timestamp": at(10), "action": "SELL 0.5", "price_usd": 103, "profit_loss_usd": -2 }),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, doc)| TickDocument {
            id: format!("tick-{i}"),
            collection: "ticks".into(),
            doc,
        })
        .collect()
    }

    #[test]
    fn test_warmup_buy_hold_sell_scenario() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mut user = UserDocument::new("demo");
        user.usd_bal = Some(Decimal::from(1000));
        user.sol_bal = Some(Decimal::from(1));

        let batch = normalize_ticks(&docs(now));
        let report = build_portfolio(
            &user,
            &batch,
            &ModelLookup::new("default"),
            DEFAULT_TRADE_SIZE,
            now,
        );
        let p = &report.portfolio;

        assert_eq!(p.total_trades, 2);
        assert_eq!(p.trades[0].action, Side::Sell);
        assert_eq!(p.trades[0].amount, Decimal::new(5, 1));
        assert_eq!(p.trades[1].action, Side::Buy);
        assert_eq!(p.trades[1].amount, Decimal::new(5, 1));
        assert_eq!(p.performance.total_profit_loss_usd, Decimal::from(8));
        assert_eq!(p.current_prices.sol_usd, Decimal::from(103));
        assert_eq!(p.balances.total_value_usd, Decimal::from(1103));
        assert_eq!(p.current_model, None);
        assert_eq!(report.ticks_data.total_ticks, 4);
        assert_eq!(report.ticks_data.latest_tick.as_ref().unwrap().id, "tick-3");
    }

    #[test]
    fn test_extreme_tick_values_do_not_abort_the_build() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mut user = UserDocument::new("demo");
        user.sol_bal = Some(Decimal::from(10));

        let mut documents = vec![TickDocument {
            id: "price".into(),
            collection: "ticks".into(),
            doc: json!({ "timestamp": now.to_rfc3339(), "action": "HOLD", "price_usd": 1e28 }),
        }];
        for i in 0..20 {
            documents.push(TickDocument {
                id: format!("pnl-{i}"),
                collection: "ticks".into(),
                doc: json!({
                    "timestamp": (now - Duration::hours(1 + i)).to_rfc3339(),
                    "action": "SELL 1",
                    "profit_loss_usd": 5e27
                }),
            });
        }

        let batch = normalize_ticks(&documents);
        let report = build_portfolio(
            &user,
            &batch,
            &ModelLookup::new("default"),
            DEFAULT_TRADE_SIZE,
            now,
        );
        let p = &report.portfolio;

        assert_eq!(p.balances.total_value_usd, Decimal::MAX);
        assert_eq!(p.performance.total_profit_loss_usd, Decimal::MAX);
        assert_eq!(p.performance.performance_24h_usd, Decimal::MAX);
        assert_eq!(p.total_trades, 20);
    }
}
