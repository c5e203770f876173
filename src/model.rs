//! Neutral market data records
//!
//! Everything downstream of the FIX decoder (order books, user callbacks)
//! works on these types; nothing here depends on the session library.

use std::time::Instant;

use rust_decimal::Decimal;

/// Price of a single book level.
pub type Price = Decimal;

/// Quantity resting at a single book level.
pub type Quantity = Decimal;

/// Side of a market data entry.
///
/// Wire encoding is the FIX `MDEntryType` character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Bid,
    Offer,
    Trade,
}

impl Side {
    /// Decode from the wire character, `None` for anything unknown.
    pub fn from_wire(c: char) -> Option<Self> {
        match c {
            '0' => Some(Side::Bid),
            '1' => Some(Side::Offer),
            '2' => Some(Side::Trade),
            _ => None,
        }
    }

    pub fn to_wire(self) -> char {
        match self {
            Side::Bid => '0',
            Side::Offer => '1',
            Side::Trade => '2',
        }
    }
}

/// Action carried by an incremental update entry (FIX `MDUpdateAction`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateAction {
    New,
    Change,
    Delete,
}

impl UpdateAction {
    pub fn from_wire(c: char) -> Option<Self> {
        match c {
            '0' => Some(UpdateAction::New),
            '1' => Some(UpdateAction::Change),
            '2' => Some(UpdateAction::Delete),
            _ => None,
        }
    }

    pub fn to_wire(self) -> char {
        match self {
            UpdateAction::New => '0',
            UpdateAction::Change => '1',
            UpdateAction::Delete => '2',
        }
    }
}

/// A single (price, quantity) level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceLevel {
    pub price: Price,
    pub quantity: Quantity,
}

impl PriceLevel {
    pub fn new(price: Price, quantity: Quantity) -> Self {
        Self { price, quantity }
    }
}

/// One entry of an incremental update or a raw trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketDataEntry {
    pub side: Side,
    pub level: PriceLevel,
    pub action: UpdateAction,
}

/// Full book refresh for a symbol.
///
/// Level order is whatever the exchange sent; the book sorts on apply.
#[derive(Debug, Clone)]
pub struct MarketDataSnapshot {
    pub symbol: String,
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
    pub recv_time: Instant,
}

/// Delta update for a symbol.
///
/// A `market_depth` of 1 marks a top-of-book stream: the single entry
/// targets the current best quote rather than a price-matched level.
#[derive(Debug, Clone)]
pub struct MarketDataIncrement {
    pub symbol: String,
    pub entries: Vec<MarketDataEntry>,
    pub market_depth: u32,
    pub recv_time: Instant,
}

/// Stream flavors a subscription can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamType {
    RawTrade,
    TopOfBook,
    FullBook,
}

/// Parameters for one market data subscription.
///
/// `subscribe` and `req_id` are filled in by the engine when the request
/// goes out; the caller only picks stream, symbol, depth and entry type.
#[derive(Debug, Clone)]
pub struct SubscriptionRequest {
    pub stream: StreamType,
    pub symbol: String,
    pub market_depth: u32,
    pub entry_type: char,
    pub subscribe: char,
    pub req_id: String,
}

impl SubscriptionRequest {
    /// Full-depth book subscription for `symbol`.
    pub fn full_book(symbol: &str, market_depth: u32) -> Self {
        Self {
            stream: StreamType::FullBook,
            symbol: symbol.to_string(),
            market_depth,
            entry_type: '0',
            subscribe: '1',
            req_id: String::new(),
        }
    }

    /// Best bid/offer subscription for `symbol`.
    pub fn top_of_book(symbol: &str, entry_type: char) -> Self {
        Self {
            stream: StreamType::TopOfBook,
            symbol: symbol.to_string(),
            market_depth: 1,
            entry_type,
            subscribe: '1',
            req_id: String::new(),
        }
    }

    /// Trade stream subscription for `symbol`.
    pub fn raw_trade(symbol: &str) -> Self {
        Self {
            stream: StreamType::RawTrade,
            symbol: symbol.to_string(),
            market_depth: 0,
            entry_type: '2',
            subscribe: '1',
            req_id: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_wire_chars() {
        assert_eq!(Side::from_wire('0'), Some(Side::Bid));
        assert_eq!(Side::from_wire('1'), Some(Side::Offer));
        assert_eq!(Side::from_wire('2'), Some(Side::Trade));
        assert_eq!(Side::from_wire('9'), None);
        assert_eq!(Side::Offer.to_wire(), '1');
    }

    #[test]
    fn test_update_action_wire_chars() {
        assert_eq!(UpdateAction::from_wire('0'), Some(UpdateAction::New));
        assert_eq!(UpdateAction::from_wire('1'), Some(UpdateAction::Change));
        assert_eq!(UpdateAction::from_wire('2'), Some(UpdateAction::Delete));
        assert_eq!(UpdateAction::from_wire('x'), None);
    }

    #[test]
    fn test_subscription_request_defaults() {
        let req = SubscriptionRequest::top_of_book("BTCUSDT", '1');
        assert_eq!(req.stream, StreamType::TopOfBook);
        assert_eq!(req.market_depth, 1);
        assert!(req.req_id.is_empty());
    }
}
