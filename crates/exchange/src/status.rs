//! Derived order status.
//!
//! Status is computed fresh on every query from the bookkeeping tables, the
//! order fields and the wall clock; it is never stored. The precedence is
//! load bearing: zero-amount invalidity always wins, a fully filled order
//! reports `FullyFilled` even after it expires, and an explicit cancellation
//! outranks mere time expiry.

use crate::exchange::Exchange;
use model::{order::Order, time};
use primitive_types::{H256, U256};
use serde::{Deserialize, Serialize};
use strum::AsRefStr;

#[derive(AsRefStr, Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderStatus {
    InvalidMakerAssetAmount,
    InvalidTakerAssetAmount,
    FullyFilled,
    Cancelled,
    Expired,
    Fillable,
}

/// A point-in-time snapshot of an order's derived state.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInfo {
    pub order_hash: H256,
    pub status: OrderStatus,
    #[serde(with = "model::u256_decimal")]
    pub taker_asset_filled_amount: U256,
}

impl Exchange {
    /// Pure read: hash, current status and fill progress of the order.
    pub fn get_order_info(&self, order: &Order) -> OrderInfo {
        let order_hash = order.hash(&self.domain_separator);
        OrderInfo {
            order_hash,
            status: self.order_status(order),
            taker_asset_filled_amount: self.filled_amount(order_hash),
        }
    }

    pub fn order_status(&self, order: &Order) -> OrderStatus {
        self.order_status_at(order, time::now_in_epoch_seconds())
    }

    pub(crate) fn order_status_at(&self, order: &Order, now: u64) -> OrderStatus {
        if order.maker_asset_amount.is_zero() {
            return OrderStatus::InvalidMakerAssetAmount;
        }
        if order.taker_asset_amount.is_zero() {
            return OrderStatus::InvalidTakerAssetAmount;
        }
        let hash = order.hash(&self.domain_separator);
        if self.filled_amount(hash) >= order.taker_asset_amount {
            return OrderStatus::FullyFilled;
        }
        if self.is_cancelled(order, hash) {
            return OrderStatus::Cancelled;
        }
        if now >= order.expiration_time_seconds {
            return OrderStatus::Expired;
        }
        OrderStatus::Fillable
    }

    /// Cancelled either individually or through the (maker, sender) epoch.
    pub(crate) fn is_cancelled(&self, order: &Order, hash: H256) -> bool {
        self.cancelled.contains(&hash)
            || self
                .order_epoch
                .get(&(order.maker, order.sender))
                .is_some_and(|epoch| order.salt <= *epoch)
    }
}
