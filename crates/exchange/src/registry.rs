//! Signer-scoped registries: validator approvals and presigned hashes.
//!
//! Both tables are keyed by the acting address, so a signer can only ever
//! mutate their own entries.

use crate::{events::Event, exchange::Exchange};
use primitive_types::{H160, H256};

impl Exchange {
    /// Grants or revokes `caller`'s approval of `validator` for delegated
    /// signature verification.
    pub fn set_validator_approval(&mut self, caller: H160, validator: H160, approved: bool) {
        if approved {
            self.approved_validators.insert((caller, validator));
        } else {
            self.approved_validators.remove(&(caller, validator));
        }
        tracing::debug!(signer = ?caller, ?validator, approved, "validator approval changed");
        self.events.push(Event::ValidatorApproval {
            signer: caller,
            validator,
            approved,
        });
    }

    pub fn is_validator_approved(&self, signer: H160, validator: H160) -> bool {
        self.approved_validators.contains(&(signer, validator))
    }

    /// Marks `hash` as signed by `caller` without a cryptographic signature.
    /// Idempotent; an entry is never cleared.
    pub fn pre_sign(&mut self, caller: H160, hash: H256) {
        if self.presigned.insert((caller, hash)) {
            tracing::debug!(signer = ?caller, ?hash, "hash presigned");
        }
    }

    pub fn is_presigned(&self, signer: H160, hash: H256) -> bool {
        self.presigned.contains(&(signer, hash))
    }
}

#[cfg(test)]
mod tests {
    use crate::testutil::exchange;
    use primitive_types::{H160, H256};

    #[test]
    fn approval_lifecycle() {
        let mut exchange = exchange();
        let (signer, validator) = (H160([1; 20]), H160([2; 20]));
        assert!(!exchange.is_validator_approved(signer, validator));

        exchange.set_validator_approval(signer, validator, true);
        assert!(exchange.is_validator_approved(signer, validator));
        // Approval is directional and signer-scoped.
        assert!(!exchange.is_validator_approved(validator, signer));
        assert!(!exchange.is_validator_approved(H160([3; 20]), validator));

        exchange.set_validator_approval(signer, validator, false);
        assert!(!exchange.is_validator_approved(signer, validator));
        assert_eq!(exchange.events().len(), 2);
    }

    #[test]
    fn presign_is_idempotent_and_scoped() {
        let mut exchange = exchange();
        let (signer, hash) = (H160([1; 20]), H256([7; 32]));
        assert!(!exchange.is_presigned(signer, hash));

        exchange.pre_sign(signer, hash);
        exchange.pre_sign(signer, hash);
        assert!(exchange.is_presigned(signer, hash));
        assert!(!exchange.is_presigned(H160([2; 20]), hash));
        assert!(!exchange.is_presigned(signer, H256([8; 32])));
    }
}
