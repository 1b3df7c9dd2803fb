//! The fill engine.
//!
//! A fill checks caller context, derived status and the maker's signature,
//! computes the proportional amounts, commits its bookkeeping and only then
//! moves assets, staged as one atomic batch. The transfer order within the
//! batch is load bearing: fee assets may be the very asset received earlier
//! in the same fill, so fees transfer last.

use crate::{
    error::{AuthorizationError, ExchangeError, StateError, TransferError, ValidationError},
    events::Event,
    exchange::Exchange,
    math,
    status::OrderStatus,
    transfer::{Transfer, TransferFailure},
};
use model::order::Order;
use primitive_types::{H160, U256};
use serde::{Deserialize, Serialize};

/// The final rounded amounts of a committed fill.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillResults {
    #[serde(with = "model::u256_decimal")]
    pub maker_asset_filled_amount: U256,
    #[serde(with = "model::u256_decimal")]
    pub taker_asset_filled_amount: U256,
    #[serde(with = "model::u256_decimal")]
    pub maker_fee_paid: U256,
    #[serde(with = "model::u256_decimal")]
    pub taker_fee_paid: U256,
}

/// One order of a batch fill.
#[derive(Clone, Debug)]
pub struct FillRequest {
    pub order: Order,
    pub taker_asset_fill_amount: U256,
    pub signature: Vec<u8>,
}

impl Exchange {
    /// Fills the order with up to `taker_asset_fill_amount` taker asset
    /// units, clamped to what the order has left.
    pub fn fill_order(
        &mut self,
        caller: H160,
        order: &Order,
        taker_asset_fill_amount: U256,
        signature: &[u8],
    ) -> Result<FillResults, ExchangeError> {
        if !order.taker.is_zero() && order.taker != caller {
            return Err(ValidationError::InvalidTakerContext {
                caller,
                taker: order.taker,
            }
            .into());
        }
        if !order.sender.is_zero() && order.sender != caller {
            return Err(ValidationError::InvalidSenderContext {
                caller,
                sender: order.sender,
            }
            .into());
        }
        let order_hash = order.hash(&self.domain_separator);
        let status = self.order_status(order);
        if status != OrderStatus::Fillable {
            return Err(StateError::OrderStatus {
                hash: order_hash,
                status,
            }
            .into());
        }
        if !self.verify_order_signature(order, signature)? {
            return Err(AuthorizationError::BadOrderSignature {
                hash: order_hash,
                signer: order.maker,
            }
            .into());
        }

        let filled_before = self.filled_amount(order_hash);
        // Fillable implies filled < taker asset amount.
        let remaining = order.taker_asset_amount - filled_before;
        let taker_fill = taker_asset_fill_amount.min(remaining);
        let maker_fill = math::safe_partial_amount_floor(
            taker_fill,
            order.taker_asset_amount,
            order.maker_asset_amount,
        )?;
        let maker_fee_paid =
            math::safe_partial_amount_floor(taker_fill, order.taker_asset_amount, order.maker_fee)?;
        let taker_fee_paid =
            math::safe_partial_amount_floor(taker_fill, order.taker_asset_amount, order.taker_fee)?;

        // Bookkeeping commits before any transfer so a reentrant fill
        // observes the updated remaining capacity, never a stale one.
        self.filled.insert(order_hash, filled_before + taker_fill);

        let transfers = [
            Transfer {
                asset: order.taker_asset_data.clone(),
                from: caller,
                to: order.maker,
                amount: taker_fill,
            },
            Transfer {
                asset: order.maker_asset_data.clone(),
                from: order.maker,
                to: caller,
                amount: maker_fill,
            },
            Transfer {
                asset: order.taker_fee_asset_data.clone(),
                from: caller,
                to: order.fee_recipient,
                amount: taker_fee_paid,
            },
            Transfer {
                asset: order.maker_fee_asset_data.clone(),
                from: order.maker,
                to: order.fee_recipient,
                amount: maker_fee_paid,
            },
        ];
        // The capability applies the whole batch or nothing; undoing this
        // fill's bookkeeping is all that is left to make a refusal
        // unobservable.
        if let Err(TransferFailure { transfer, cause }) = self.transfers.transfer_all(&transfers) {
            self.filled.insert(order_hash, filled_before);
            return Err(TransferError {
                hash: order_hash,
                asset: transfer.asset,
                from: transfer.from,
                to: transfer.to,
                amount: transfer.amount,
                source: cause,
            }
            .into());
        }

        tracing::info!(
            ?order_hash,
            taker = ?caller,
            %taker_fill,
            %maker_fill,
            "order filled"
        );
        self.events.push(Event::Fill {
            maker: order.maker,
            taker: caller,
            fee_recipient: order.fee_recipient,
            sender: order.sender,
            maker_asset_filled_amount: maker_fill,
            taker_asset_filled_amount: taker_fill,
            maker_fee_paid,
            taker_fee_paid,
            order_hash,
            maker_asset_data: order.maker_asset_data.clone(),
            taker_asset_data: order.taker_asset_data.clone(),
        });
        Ok(FillResults {
            maker_asset_filled_amount: maker_fill,
            taker_asset_filled_amount: taker_fill,
            maker_fee_paid,
            taker_fee_paid,
        })
    }

    /// Like [`Exchange::fill_order`] but refuses to fill less than the
    /// requested amount.
    pub fn fill_or_kill_order(
        &mut self,
        caller: H160,
        order: &Order,
        taker_asset_fill_amount: U256,
        signature: &[u8],
    ) -> Result<FillResults, ExchangeError> {
        // Checked before filling: a too-small fill cannot be taken back
        // once transfers have run.
        let order_hash = order.hash(&self.domain_separator);
        let remaining = order
            .taker_asset_amount
            .saturating_sub(self.filled_amount(order_hash));
        if remaining < taker_asset_fill_amount {
            return Err(StateError::IncompleteFill {
                hash: order_hash,
                taker_asset_filled_amount: remaining,
            }
            .into());
        }
        self.fill_order(caller, order, taker_asset_fill_amount, signature)
    }

    /// Fills `requests` one by one; the first error aborts the batch,
    /// leaving earlier fills committed.
    pub fn batch_fill_orders(
        &mut self,
        caller: H160,
        requests: &[FillRequest],
    ) -> Result<Vec<FillResults>, ExchangeError> {
        requests
            .iter()
            .map(|request| {
                self.fill_order(
                    caller,
                    &request.order,
                    request.taker_asset_fill_amount,
                    &request.signature,
                )
            })
            .collect()
    }
}
