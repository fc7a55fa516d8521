use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use super::fields::{self, first_present};
use super::tick::TickEvent;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Balances {
    #[serde(with = "rust_decimal::serde::float")]
    pub usd: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub sol: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub sol_value_usd: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_value_usd: Decimal,
}

impl Balances {
    pub fn new(usd: Decimal, sol: Decimal, sol_price_usd: Decimal) -> Self {
        let sol_value_usd = clamped_mul(sol, sol_price_usd);
        Self {
            usd,
            sol,
            sol_value_usd,
            total_value_usd: clamped_add(usd, sol_value_usd),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentPrices {
    #[serde(with = "rust_decimal::serde::float")]
    pub sol_usd: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Performance {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_profit_loss_usd: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub performance_24h_usd: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub performance_24h_percent: Decimal,
}

/// `(timestamp, usd_value, sol_value)`, serialized as a JSON triple.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint(
    pub String,
    #[serde(with = "rust_decimal::serde::float")] pub Decimal,
    #[serde(with = "rust_decimal::serde::float")] pub Decimal,
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HistorySource {
    /// Taken from the user's stored `portfolio_history`.
    Precomputed,
    /// Rebuilt from ticks.
    Recomputed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub balances: Balances,
    pub current_prices: CurrentPrices,
    pub performance: Performance,
    pub performance_history: Vec<HistoryPoint>,
    pub history_source: HistorySource,
}

/// Account balances the summary is computed against.
#[derive(Debug, Clone, Copy)]
pub struct Holdings {
    pub usd: Decimal,
    pub sol: Decimal,
}

/// Summarize the full, unfiltered tick set.
///
/// P&L sums cover every tick, not only BUY/SELL ones: mark-to-market ticks
/// carry P&L too.
pub fn summarize(
    ticks: &[TickEvent],
    holdings: Holdings,
    precomputed_history: Option<&[Value]>,
    now: DateTime<Utc>,
) -> PerformanceSummary {
    let sol_price = current_sol_price(ticks);
    let balances = Balances::new(holdings.usd, holdings.sol, sol_price);

    let performance_24h_usd = profit_loss_since(ticks, now - Duration::hours(24));
    let performance = Performance {
        total_profit_loss_usd: clamped_sum(ticks.iter().map(|t| t.profit_loss_usd)),
        performance_24h_usd,
        performance_24h_percent: percent_of(performance_24h_usd, balances.total_value_usd),
    };

    let (performance_history, history_source) = match precomputed_history {
        Some(entries) if !entries.is_empty() => {
            (precomputed_points(entries), HistorySource::Precomputed)
        }
        _ => (daily_history(ticks), HistorySource::Recomputed),
    };

    PerformanceSummary {
        balances,
        current_prices: CurrentPrices { sol_usd: sol_price },
        performance,
        performance_history,
        history_source,
    }
}

/// `price_usd` of the most recent tick, 0 without ticks.
pub fn current_sol_price(ticks: &[TickEvent]) -> Decimal {
    ticks
        .iter()
        .max_by_key(|t| t.timestamp)
        .map(|t| t.price_usd)
        .unwrap_or(Decimal::ZERO)
}

/// Sum of P&L on ticks at or after `since`.
pub fn profit_loss_since(ticks: &[TickEvent], since: DateTime<Utc>) -> Decimal {
    clamped_sum(
        ticks
            .iter()
            .filter(|t| t.timestamp >= since)
            .map(|t| t.profit_loss_usd),
    )
}

/// `a + b`, pinned to `Decimal::MAX` / `Decimal::MIN` on overflow.
pub fn clamped_add(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b).unwrap_or_else(|| {
        tracing::warn!(lhs = %a, rhs = %b, "Decimal addition overflowed, clamping");
        if b.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        }
    })
}

/// `a * b`, pinned to `Decimal::MAX` / `Decimal::MIN` on overflow.
pub fn clamped_mul(a: Decimal, b: Decimal) -> Decimal {
    a.checked_mul(b).unwrap_or_else(|| {
        tracing::warn!(lhs = %a, rhs = %b, "Decimal multiplication overflowed, clamping");
        if a.is_sign_negative() != b.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        }
    })
}

pub fn clamped_sum(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    values.into_iter().fold(Decimal::ZERO, clamped_add)
}

/// `part / whole * 100`, or 0 when `whole` is not positive.
pub fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

/// One point per UTC day: the wallet balances of that day's latest tick.
pub fn daily_history(ticks: &[TickEvent]) -> Vec<HistoryPoint> {
    let mut latest_per_day: BTreeMap<NaiveDate, &TickEvent> = BTreeMap::new();

    for tick in ticks {
        let day = tick.timestamp.date_naive();
        match latest_per_day.get(&day) {
            Some(existing) if existing.timestamp > tick.timestamp => {}
            _ => {
                latest_per_day.insert(day, tick);
            }
        }
    }

    latest_per_day
        .into_values()
        .map(|tick| {
            HistoryPoint(
                fields::format_timestamp(tick.timestamp),
                tick.wallet_balance_usd.unwrap_or(Decimal::ZERO),
                tick.wallet_balance_sol.unwrap_or(Decimal::ZERO),
            )
        })
        .collect()
}

// Field precedence for object-shaped precomputed entries.
const HISTORY_TIMESTAMP_KEYS: &[&str] = &["timestamp", "date"];
const HISTORY_USD_KEYS: &[&str] = &["usd", "usd_value", "value"];
const HISTORY_SOL_KEYS: &[&str] = &["sol", "sol_value"];

/// Normalize a stored `portfolio_history` array.
///
/// Entries are `[timestamp, usd, sol]` triples or objects; timestamps may be
/// native dates. Entries without a readable timestamp are skipped.
pub fn precomputed_points(entries: &[Value]) -> Vec<HistoryPoint> {
    let mut points: Vec<(DateTime<Utc>, Decimal, Decimal)> = entries
        .iter()
        .filter_map(|entry| {
            let (ts, usd, sol) = match entry {
                Value::Array(items) => (items.first(), items.get(1), items.get(2)),
                Value::Object(_) => (
                    first_present(entry, HISTORY_TIMESTAMP_KEYS),
                    first_present(entry, HISTORY_USD_KEYS),
                    first_present(entry, HISTORY_SOL_KEYS),
                ),
                _ => return None,
            };
            let ts = ts.and_then(fields::timestamp)?;
            let amount = |v: Option<&Value>| v.and_then(fields::decimal).unwrap_or(Decimal::ZERO);
            Some((ts, amount(usd), amount(sol)))
        })
        .collect();

    points.sort_by_key(|(ts, _, _)| *ts);
    points
        .into_iter()
        .map(|(ts, usd, sol)| HistoryPoint(fields::format_timestamp(ts), usd, sol))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::action::classify_action;
    use chrono::TimeZone;
    use serde_json::json;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn tick(ts: DateTime<Utc>, pnl: i64, price: i64) -> TickEvent {
        TickEvent {
            id: ts.to_rfc3339(),
            timestamp: ts,
            raw_action: Some("HOLD".into()),
            action: classify_action(Some("HOLD")),
            price_usd: Decimal::from(price),
            wallet_balance_sol: None,
            wallet_balance_usd: None,
            profit_loss_usd: Decimal::from(pnl),
            source_collection: None,
        }
    }

    fn with_wallet(mut t: TickEvent, usd: i64, sol: i64) -> TickEvent {
        t.wallet_balance_usd = Some(Decimal::from(usd));
        t.wallet_balance_sol = Some(Decimal::from(sol));
        t
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_totals_and_24h_window() {
        let ticks = vec![
            tick(now() - Duration::hours(48), 100, 140),
            tick(now() - Duration::hours(24), 5, 150), // boundary is inclusive
            tick(now() - Duration::hours(1), -2, 160),
        ];
        let holdings = Holdings {
            usd: Decimal::from(1000),
            sol: Decimal::from(2),
        };

        let summary = summarize(&ticks, holdings, None, now());

        assert_eq!(summary.current_prices.sol_usd, Decimal::from(160));
        assert_eq!(summary.balances.sol_value_usd, Decimal::from(320));
        assert_eq!(summary.balances.total_value_usd, Decimal::from(1320));
        assert_eq!(summary.performance.total_profit_loss_usd, Decimal::from(103));
        assert_eq!(summary.performance.performance_24h_usd, Decimal::from(3));
        assert_eq!(
            summary.performance.performance_24h_percent,
            Decimal::from(3) / Decimal::from(1320) * Decimal::ONE_HUNDRED
        );
    }

    #[test]
    fn test_oversized_values_clamp_instead_of_panicking() {
        let huge_price = tick(now(), 0, 0);
        let huge_price = TickEvent {
            price_usd: Decimal::from_scientific("1e28").unwrap(),
            ..huge_price
        };
        let holdings = Holdings {
            usd: Decimal::from(5),
            sol: Decimal::from(10),
        };

        let summary = summarize(&[huge_price], holdings, None, now());
        assert_eq!(summary.balances.sol_value_usd, Decimal::MAX);
        assert_eq!(summary.balances.total_value_usd, Decimal::MAX);

        let big_pnl: Vec<TickEvent> = (0..20)
            .map(|i| TickEvent {
                profit_loss_usd: Decimal::from_scientific("5e27").unwrap(),
                ..tick(now() - Duration::minutes(i), 0, 1)
            })
            .collect();
        let summary = summarize(&big_pnl, holdings, None, now());
        assert_eq!(summary.performance.total_profit_loss_usd, Decimal::MAX);
        assert_eq!(summary.performance.performance_24h_usd, Decimal::MAX);
    }

    #[test]
    fn test_clamped_arithmetic_signs() {
        assert_eq!(clamped_add(Decimal::MIN, Decimal::NEGATIVE_ONE), Decimal::MIN);
        assert_eq!(clamped_mul(Decimal::MAX, Decimal::from(-2)), Decimal::MIN);
        assert_eq!(clamped_sum([Decimal::ONE, Decimal::from(2)]), Decimal::from(3));
    }

    #[test]
    fn test_percent_is_zero_without_value() {
        let ticks = vec![tick(now(), 50, 0)];
        let holdings = Holdings {
            usd: Decimal::ZERO,
            sol: Decimal::from(3),
        };

        let summary = summarize(&ticks, holdings, None, now());

        assert_eq!(summary.balances.total_value_usd, Decimal::ZERO);
        assert_eq!(summary.performance.performance_24h_usd, Decimal::from(50));
        assert_eq!(summary.performance.performance_24h_percent, Decimal::ZERO);
    }

    #[test]
    fn test_no_ticks() {
        let holdings = Holdings {
            usd: Decimal::from(10),
            sol: Decimal::from(1),
        };
        let summary = summarize(&[], holdings, None, now());

        assert_eq!(summary.current_prices.sol_usd, Decimal::ZERO);
        assert_eq!(summary.balances.total_value_usd, Decimal::from(10));
        assert!(summary.performance_history.is_empty());
        assert_eq!(summary.history_source, HistorySource::Recomputed);
    }

    #[test]
    fn test_daily_history_keeps_latest_per_day() {
        let day1 = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap();
        let ticks = vec![
            with_wallet(tick(day1 + Duration::hours(1), 0, 1), 100, 1),
            with_wallet(tick(day1 + Duration::hours(20), 0, 1), 110, 2),
            with_wallet(tick(day2 + Duration::hours(3), 0, 1), 90, 3),
        ];

        let history = daily_history(&ticks);

        assert_eq!(
            history,
            vec![
                HistoryPoint("2024-06-01T20:00:00.000Z".into(), Decimal::from(110), Decimal::from(2)),
                HistoryPoint("2024-06-02T03:00:00.000Z".into(), Decimal::from(90), Decimal::from(3)),
            ]
        );
    }

    #[test]
    fn test_daily_history_is_order_independent() {
        let day = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let ticks = vec![
            with_wallet(tick(day + Duration::hours(9), 0, 1), 7, 7),
            with_wallet(tick(day + Duration::hours(2), 0, 1), 1, 1),
        ];

        let history = daily_history(&ticks);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].1, Decimal::from(7));
    }

    #[test]
    fn test_precomputed_history_wins() {
        let stored = vec![
            json!({ "timestamp": { "$date": "2024-06-02T00:00:00Z" }, "usd": 20, "sol": "0.5" }),
            json!(["2024-06-01T00:00:00Z", 10, 0.25]),
            json!({ "date": "2024-06-03", "usd_value": 30 }),
            json!({ "usd": 99 }),
        ];
        let ticks = vec![with_wallet(tick(now(), 0, 1), 1, 1)];
        let holdings = Holdings {
            usd: Decimal::ZERO,
            sol: Decimal::ZERO,
        };

        let summary = summarize(&ticks, holdings, Some(stored.as_slice()), now());

        assert_eq!(summary.history_source, HistorySource::Precomputed);
        assert_eq!(
            summary.performance_history,
            vec![
                HistoryPoint("2024-06-01T00:00:00.000Z".into(), Decimal::from(10), dec("0.25")),
                HistoryPoint("2024-06-02T00:00:00.000Z".into(), Decimal::from(20), dec("0.5")),
                HistoryPoint("2024-06-03T00:00:00.000Z".into(), Decimal::from(30), Decimal::ZERO),
            ]
        );
    }

    #[test]
    fn test_empty_precomputed_history_recomputes() {
        let ticks = vec![with_wallet(tick(now(), 0, 1), 5, 6)];
        let holdings = Holdings {
            usd: Decimal::ZERO,
            sol: Decimal::ZERO,
        };

        let summary = summarize(&ticks, holdings, Some(&[][..]), now());

        assert_eq!(summary.history_source, HistorySource::Recomputed);
        assert_eq!(summary.performance_history.len(), 1);
    }

    #[test]
    fn test_history_serializes_as_triples() {
        let point = HistoryPoint("2024-06-01T00:00:00.000Z".into(), dec("10.5"), dec("0.25"));
        assert_eq!(
            serde_json::to_value(&point).unwrap(),
            json!(["2024-06-01T00:00:00.000Z", 10.5, 0.25])
        );
    }
}
