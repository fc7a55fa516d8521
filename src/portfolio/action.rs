use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::Side;

/// Quantity booked for a trade whose action text carries no amount (0.001 SOL).
pub const DEFAULT_TRADE_SIZE: Decimal = Decimal::from_parts(1, 0, 0, false, 3);

/// The classified form of a tick's free-form `action` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickAction {
    /// Field missing or blank.
    Absent,
    /// A non-trade keyword such as `WARMUP` or `HOLD`.
    Signal(String),
    Trade(TradeAction),
}

impl TickAction {
    pub fn as_trade(&self) -> Option<&TradeAction> {
        match self {
            TickAction::Trade(trade) => Some(trade),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeAction {
    pub kind: Side,
    pub quantity: Quantity,
}

/// Which of the observed action shapes the amount came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Quantity {
    /// `BUY 0.0010 SOL @ $193.56`
    Annotated {
        amount: Decimal,
        quoted_price: Option<Decimal>,
    },
    /// `BUY 0.0010`
    Plain(Decimal),
    /// `BUY`, or anything after the keyword that is not a decimal.
    Unspecified,
}

impl TradeAction {
    pub fn amount_or(&self, default_size: Decimal) -> Decimal {
        match &self.quantity {
            Quantity::Annotated { amount, .. } | Quantity::Plain(amount) => *amount,
            Quantity::Unspecified => default_size,
        }
    }

    /// The `@ $<price>` quote, when the action carried one.
    pub fn quoted_price(&self) -> Option<Decimal> {
        match &self.quantity {
            Quantity::Annotated { quoted_price, .. } => *quoted_price,
            _ => None,
        }
    }
}

/// Result of [`parse_action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParsedAction {
    pub kind: Side,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

/// Classify a raw action string and extract its trade quantity.
///
/// Returns `None` for anything that is not a trade (`WARMUP`, `HOLD`, blank).
/// Bare `BUY` / `SELL` book [`DEFAULT_TRADE_SIZE`].
pub fn parse_action(raw: &str) -> Option<ParsedAction> {
    classify_action(Some(raw)).as_trade().map(|trade| ParsedAction {
        kind: trade.kind,
        amount: trade.amount_or(DEFAULT_TRADE_SIZE),
    })
}

/// Turn an optional action string into a [`TickAction`].
///
/// The keyword match is a case-sensitive prefix test on the trimmed text.
/// The amount is the first whitespace-separated token after the keyword, if
/// it is a decimal. A unit token may follow, optionally followed by a
/// `@ $<price>` quote.
pub fn classify_action(raw: Option<&str>) -> TickAction {
    let Some(text) = raw.map(str::trim).filter(|t| !t.is_empty()) else {
        return TickAction::Absent;
    };

    let (kind, rest) = if let Some(rest) = text.strip_prefix("BUY") {
        (Side::Buy, rest)
    } else if let Some(rest) = text.strip_prefix("SELL") {
        (Side::Sell, rest)
    } else {
        return TickAction::Signal(text.to_string());
    };

    TickAction::Trade(TradeAction {
        kind,
        quantity: parse_quantity(rest),
    })
}

fn parse_quantity(rest: &str) -> Quantity {
    // "BUYBACK 5" must not read "5" as the amount of a BUY.
    if !rest.starts_with(char::is_whitespace) {
        return Quantity::Unspecified;
    }

    let mut tokens = rest.split_whitespace();
    let Some(amount) = tokens.next().and_then(parse_decimal) else {
        return Quantity::Unspecified;
    };

    match tokens.next() {
        Some(_) => {
            let quoted_price = match (tokens.next(), tokens.next()) {
                (Some("@"), Some(price)) => parse_decimal(price.trim_start_matches('$')),
                _ => None,
            };
            Quantity::Annotated {
                amount,
                quoted_price,
            }
        }
        None => Quantity::Plain(amount),
    }
}

fn parse_decimal(token: &str) -> Option<Decimal> {
    if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    Decimal::from_str(token).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_non_trades() {
        for raw in ["", "   ", "WARMUP", "HOLD", "buy 0.5", " hold", "NOOP BUY 1"] {
            assert_eq!(parse_action(raw), None, "{raw:?} should not be a trade");
        }
        assert_eq!(classify_action(None), TickAction::Absent);
        assert_eq!(
            classify_action(Some(" HOLD ")),
            TickAction::Signal("HOLD".into())
        );
    }

    #[test]
    fn test_plain_amounts() {
        let parsed = parse_action("BUY 0.0010").unwrap();
        assert_eq!(parsed.kind, Side::Buy);
        assert_eq!(parsed.amount, dec("0.0010"));

        let parsed = parse_action("SELL 12.5").unwrap();
        assert_eq!(parsed.kind, Side::Sell);
        assert_eq!(parsed.amount, dec("12.5"));

        let parsed = parse_action("  SELL   3  ").unwrap();
        assert_eq!(parsed.amount, Decimal::from(3));
    }

    #[test]
    fn test_annotated_amount() {
        let parsed = parse_action("BUY 0.0010 SOL @ $193.56").unwrap();
        assert_eq!(parsed.kind, Side::Buy);
        assert_eq!(parsed.amount, dec("0.0010"));

        let action = classify_action(Some("BUY 0.0010 SOL @ $193.56"));
        let trade = action.as_trade().unwrap();
        assert_eq!(
            trade.quantity,
            Quantity::Annotated {
                amount: dec("0.0010"),
                quoted_price: Some(dec("193.56")),
            }
        );
        assert_eq!(trade.quoted_price(), Some(dec("193.56")));
        assert_eq!(
            classify_action(Some("BUY 0.5 SOL")).as_trade().unwrap().quoted_price(),
            None
        );
    }

    #[test]
    fn test_bare_keyword_uses_default_size() {
        let parsed = parse_action("SELL").unwrap();
        assert_eq!(parsed.kind, Side::Sell);
        assert_eq!(parsed.amount, DEFAULT_TRADE_SIZE);
        assert_eq!(DEFAULT_TRADE_SIZE, dec("0.001"));
    }

    #[test]
    fn test_unparseable_amount_uses_default_size() {
        assert_eq!(parse_action("BUY all").unwrap().amount, DEFAULT_TRADE_SIZE);
        assert_eq!(parse_action("BUY 1.2.3").unwrap().amount, DEFAULT_TRADE_SIZE);
        assert_eq!(parse_action("SELL -1").unwrap().amount, DEFAULT_TRADE_SIZE);

        let buyback = parse_action("BUYBACK 5").unwrap();
        assert_eq!(buyback.kind, Side::Buy);
        assert_eq!(buyback.amount, DEFAULT_TRADE_SIZE);
    }

    #[test]
    fn test_amount_or_prefers_parsed_amount() {
        let trade = TradeAction {
            kind: Side::Buy,
            quantity: Quantity::Plain(dec("0.25")),
        };
        assert_eq!(trade.amount_or(Decimal::ONE), dec("0.25"));

        let bare = TradeAction {
            kind: Side::Buy,
            quantity: Quantity::Unspecified,
        };
        assert_eq!(bare.amount_or(Decimal::ONE), Decimal::ONE);
    }
}
