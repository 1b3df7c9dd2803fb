//! Append-only notification log for off-band indexers.

use model::asset::AssetData;
use primitive_types::{H160, H256, U256};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event {
    /// A fill committed, with the final rounded amounts.
    Fill {
        maker: H160,
        taker: H160,
        fee_recipient: H160,
        sender: H160,
        maker_asset_filled_amount: U256,
        taker_asset_filled_amount: U256,
        maker_fee_paid: U256,
        taker_fee_paid: U256,
        order_hash: H256,
        maker_asset_data: AssetData,
        taker_asset_data: AssetData,
    },
    /// A single order was cancelled by its maker.
    Cancel {
        maker: H160,
        fee_recipient: H160,
        sender: H160,
        order_hash: H256,
        maker_asset_data: AssetData,
        taker_asset_data: AssetData,
    },
    /// All orders of the (maker, sender) pair with salt up to and including
    /// `order_epoch` are now cancelled.
    CancelUpTo {
        maker: H160,
        sender: H160,
        order_epoch: U256,
    },
    /// A signer changed the approval of a delegated validator.
    ValidatorApproval {
        signer: H160,
        validator: H160,
        approved: bool,
    },
}
