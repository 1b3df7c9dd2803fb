//! The settlement core.
//!
//! [`Exchange`] owns the shared bookkeeping tables (fill amounts,
//! cancellations, epochs, validator approvals, presigns) and exposes the
//! ledger entry points: filling, cancellation, signature pre-checks and the
//! signer-scoped registries. Asset movement and external signature verifiers
//! are injected capabilities; everything else is deterministic state.

pub mod error;
pub mod events;
pub mod transfer;

mod cancellation;
mod exchange;
mod fill;
mod math;
mod registry;
mod signatures;
mod status;

#[cfg(test)]
pub(crate) mod testutil;

pub use crate::{
    error::{
        AuthorizationError, ExchangeError, MathError, StateError, TransferError, ValidationError,
    },
    events::Event,
    exchange::Exchange,
    fill::{FillRequest, FillResults},
    signatures::{
        RichVerifier, ValidatorVerifier, VerifierCallError, WalletVerifier, ACCEPTED_MARKER,
    },
    status::{OrderInfo, OrderStatus},
    transfer::{AssetTransfers, Transfer, TransferFailure},
};
