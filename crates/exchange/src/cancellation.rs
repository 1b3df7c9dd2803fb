//! Single-order and epoch-based bulk cancellation.

use crate::{
    error::{ExchangeError, StateError, ValidationError},
    events::Event,
    exchange::Exchange,
    status::OrderStatus,
};
use model::order::Order;
use primitive_types::{H160, U256};

impl Exchange {
    /// Cancels a single order. Only its maker may do so.
    ///
    /// Orders that are already unreachable (cancelled, expired, fully
    /// filled, zero amounts) are left untouched without an error or event:
    /// cancellation must never fail just because the order cannot be filled
    /// anyway.
    pub fn cancel_order(&mut self, caller: H160, order: &Order) -> Result<(), ExchangeError> {
        if caller != order.maker {
            return Err(ValidationError::InvalidMakerContext {
                caller,
                maker: order.maker,
            }
            .into());
        }
        let status = self.order_status(order);
        if status != OrderStatus::Fillable {
            tracing::debug!(
                maker = ?order.maker,
                status = status.as_ref(),
                "skipped cancelling unreachable order"
            );
            return Ok(());
        }
        let order_hash = order.hash(&self.domain_separator);
        self.cancelled.insert(order_hash);
        tracing::info!(?order_hash, maker = ?order.maker, "order cancelled");
        self.events.push(Event::Cancel {
            maker: order.maker,
            fee_recipient: order.fee_recipient,
            sender: order.sender,
            order_hash,
            maker_asset_data: order.maker_asset_data.clone(),
            taker_asset_data: order.taker_asset_data.clone(),
        });
        Ok(())
    }

    /// Cancels `orders` one by one; the first error aborts the batch.
    pub fn batch_cancel_orders(
        &mut self,
        caller: H160,
        orders: &[Order],
    ) -> Result<(), ExchangeError> {
        for order in orders {
            self.cancel_order(caller, order)?;
        }
        Ok(())
    }

    /// Bulk-cancels every order of the (caller, sender) pair whose salt is
    /// at most `new_epoch`, in a single bookkeeping write.
    ///
    /// The epoch only moves forward; passing a value at or below the current
    /// epoch fails with the smallest acceptable one.
    pub fn cancel_orders_up_to(
        &mut self,
        caller: H160,
        sender: H160,
        new_epoch: U256,
    ) -> Result<(), ExchangeError> {
        let current = self
            .order_epoch
            .get(&(caller, sender))
            .copied()
            .unwrap_or_default();
        if new_epoch <= current {
            return Err(StateError::OrderEpoch {
                maker: caller,
                sender,
                min_epoch: current.saturating_add(U256::one()),
            }
            .into());
        }
        self.order_epoch.insert((caller, sender), new_epoch);
        tracing::info!(maker = ?caller, ?sender, %new_epoch, "orders cancelled up to epoch");
        self.events.push(Event::CancelUpTo {
            maker: caller,
            sender,
            order_epoch: new_epoch,
        });
        Ok(())
    }
}
