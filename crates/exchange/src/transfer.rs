//! The asset movement seam.
//!
//! The settlement core never interprets asset descriptors beyond hashing
//! them; moving value is delegated to an injected capability so that new
//! asset kinds do not touch fill logic. The capability receives every
//! transfer of a fill as one staged batch and applies it atomically, so a
//! rejection in the middle of a fill cannot leave earlier transfers behind.

use model::asset::AssetData;
use primitive_types::{H160, U256};
use thiserror::Error;

/// One staged asset movement of a fill.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Transfer {
    pub asset: AssetData,
    pub from: H160,
    pub to: H160,
    pub amount: U256,
}

/// Why the capability refused a staged batch.
///
/// Carries the refused transfer by value so callers can report it without
/// trusting an index into the batch.
#[derive(Debug, Error)]
#[error("asset transfer rejected")]
pub struct TransferFailure {
    pub transfer: Transfer,
    #[source]
    pub cause: anyhow::Error,
}

impl TransferFailure {
    pub fn new(transfer: Transfer, cause: impl Into<anyhow::Error>) -> Self {
        Self {
            transfer,
            cause: cause.into(),
        }
    }
}

/// Moves every staged transfer from its `from` to its `to` address, or
/// fails with none of them observable.
///
/// Per element, implementations must recurse for [`AssetData::MultiAsset`]
/// (scaling each nested element by its per-unit amount), treat
/// [`AssetData::StaticCall`] as a predicate that moves nothing, and deliver
/// at least the requested amount for [`AssetData::Erc20Bridge`], crediting
/// any surplus to the receiver. Zero-amount transfers are legal and must
/// succeed for assets the holder could transfer at all.
#[cfg_attr(test, mockall::automock)]
pub trait AssetTransfers {
    fn transfer_all(&mut self, transfers: &[Transfer]) -> Result<(), TransferFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::SharedLedger;
    use primitive_types::H256;

    const TOKEN: H160 = H160([0xaa; 20]);
    const FROM: H160 = H160([1; 20]);
    const TO: H160 = H160([2; 20]);

    fn erc20(token: H160, from: H160, to: H160, amount: U256) -> Transfer {
        Transfer {
            asset: AssetData::Erc20 { token },
            from,
            to,
            amount,
        }
    }

    #[test]
    fn a_rejected_batch_leaves_no_transfer_applied() {
        let mut ledger = SharedLedger::default();
        ledger.fund(TOKEN, FROM, 100.into());
        let batch = [
            erc20(TOKEN, FROM, TO, 40.into()),
            // More than the 40 units the receiver just got.
            erc20(TOKEN, TO, FROM, 50.into()),
        ];
        let failure = ledger.transfer_all(&batch).unwrap_err();
        assert_eq!(failure.transfer, batch[1]);
        assert_eq!(ledger.balance(TOKEN, FROM), 100.into());
        assert_eq!(ledger.balance(TOKEN, TO), 0.into());
    }

    #[test]
    fn credit_overflow_does_not_take_the_debit() {
        let mut ledger = SharedLedger::default();
        ledger.fund(TOKEN, FROM, 10.into());
        ledger.fund(TOKEN, TO, U256::MAX);
        assert!(ledger
            .transfer_all(&[erc20(TOKEN, FROM, TO, 10.into())])
            .is_err());
        assert_eq!(ledger.balance(TOKEN, FROM), 10.into());
        assert_eq!(ledger.balance(TOKEN, TO), U256::MAX);
    }

    #[test]
    fn failed_multi_asset_element_undoes_the_earlier_ones() {
        let mut ledger = SharedLedger::default();
        ledger.fund(TOKEN, FROM, 100.into());
        let nft = H160([0xcd; 20]);
        // The sender does not own the nft, so the bundle cannot settle.
        let bundle = Transfer {
            asset: AssetData::MultiAsset {
                amounts: vec![1.into(), 1.into()],
                nested: vec![
                    AssetData::Erc20 { token: TOKEN },
                    AssetData::Erc721 {
                        token: nft,
                        token_id: 7.into(),
                    },
                ],
            },
            from: FROM,
            to: TO,
            amount: 1.into(),
        };
        assert!(ledger.transfer_all(&[bundle]).is_err());
        assert_eq!(ledger.balance(TOKEN, FROM), 100.into());
        assert_eq!(ledger.balance(TOKEN, TO), 0.into());
    }

    #[test]
    fn bridged_assets_deliver_at_least_the_requested_amount() {
        let mut ledger = SharedLedger::default();
        ledger.set_bridge_surplus(3.into());
        let transfer = Transfer {
            asset: AssetData::Erc20Bridge {
                token: TOKEN,
                bridge: H160([9; 20]),
                bridge_data: vec![0x01],
            },
            from: FROM,
            to: TO,
            amount: 10.into(),
        };
        ledger.transfer_all(&[transfer]).unwrap();
        assert_eq!(ledger.balance(TOKEN, TO), 13.into());
    }

    #[test]
    fn static_calls_are_predicates_that_move_nothing() {
        let mut ledger = SharedLedger::default();
        let target = H160([7; 20]);
        let transfer = Transfer {
            asset: AssetData::StaticCall {
                target,
                data: vec![0x0b],
                expected_return: H256([0x11; 32]),
            },
            from: FROM,
            to: TO,
            amount: 1.into(),
        };
        assert!(ledger.transfer_all(&[transfer.clone()]).is_err());

        ledger.expect_call(target, vec![0x0b], H256([0x11; 32]));
        ledger.transfer_all(&[transfer]).unwrap();
        assert_eq!(ledger.balance(TOKEN, TO), 0.into());
    }
}
