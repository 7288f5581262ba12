//! The limit order payload carried by a `TradingOrder` transaction.

use serde::{Deserialize, Serialize};

use crate::config::{TRADING_ORDER_BUY_TYPE, TRADING_ORDER_SELL_TYPE};
use crate::crypto::TxHash;
use crate::transaction::NativeAddress;

/// Which side of the book an order rests on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    /// Bid: locks quote asset to buy base asset.
    Buy,
    /// Ask: locks base asset to sell it for quote asset.
    Sell,
}

impl OrderSide {
    pub fn order_type(self) -> u8 {
        match self {
            Self::Buy => TRADING_ORDER_BUY_TYPE,
            Self::Sell => TRADING_ORDER_SELL_TYPE,
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// A limit order as encoded in the transaction payload.
///
/// `order_type` stays a raw discriminant so that an unknown value decodes
/// and is rejected as a data error instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingOrder {
    pub order_type: u8,
    /// Address the filled asset is paid to.
    pub address: NativeAddress,
    pub trading_pair_hash: TxHash,
    /// Price of one base unit, scaled by the quote asset's decimals.
    pub price: u128,
    /// Order size, scaled by the base asset's decimals.
    pub amount: u128,
}

impl TradingOrder {
    pub fn new(
        side: OrderSide,
        address: NativeAddress,
        trading_pair_hash: TxHash,
        price: u128,
        amount: u128,
    ) -> Self {
        Self {
            order_type: side.order_type(),
            address,
            trading_pair_hash,
            price,
            amount,
        }
    }

    /// `None` for an unknown order type.
    pub fn side(&self) -> Option<OrderSide> {
        match self.order_type {
            TRADING_ORDER_BUY_TYPE => Some(OrderSide::Buy),
            TRADING_ORDER_SELL_TYPE => Some(OrderSide::Sell),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_decodes_known_types_only() {
        let mut order = TradingOrder::new(
            OrderSide::Sell,
            NativeAddress::new("seller"),
            TxHash::digest(b"pair"),
            1,
            1,
        );
        assert_eq!(order.side(), Some(OrderSide::Sell));

        order.order_type = TRADING_ORDER_BUY_TYPE;
        assert_eq!(order.side(), Some(OrderSide::Buy));

        order.order_type = 7;
        assert_eq!(order.side(), None);
    }
}
