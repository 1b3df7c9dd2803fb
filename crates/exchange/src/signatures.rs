//! Multi-scheme signature verification.
//!
//! Dispatches on the decoded [`Signature`] variant. The recoverable schemes
//! are checked in-process; the delegated schemes consult an injected
//! verifier capability and compare its raw response bytes against
//! [`ACCEPTED_MARKER`]. Verifier callbacks are trusted to be read-only;
//! nothing here hands them mutable state.
//!
//! Two call contexts exist. Hash-only entry points (off-band pre-checks
//! knowing nothing but a 32 byte hash) reject the schemes that need the full
//! structured message and map delegation failures to a plain `false`. Full
//! order/transaction contexts surface delegation failures as authorization
//! errors so the fill engine can distinguish "the wallet said no" from "the
//! wallet could not be asked".

use crate::{
    error::{AuthorizationError, ExchangeError, ValidationError},
    exchange::Exchange,
};
use hex_literal::hex;
use model::{
    order::Order,
    signature::{
        EcdsaSignature, EcdsaSigningScheme, Signature, SignatureDecodeError, SignatureScheme,
    },
    transaction::Transaction,
};
use primitive_types::{H160, H256};
use thiserror::Error;

/// The exact bytes a delegated verifier must return to accept a signature.
///
/// Anything else, including a longer response that merely starts with these
/// bytes, is a rejection.
pub const ACCEPTED_MARKER: [u8; 4] = hex!("1626ba7e");

/// The verifier capability could not be consulted at all.
#[derive(Debug, Error)]
#[error("external verifier call failed")]
pub struct VerifierCallError(#[source] pub anyhow::Error);

impl VerifierCallError {
    pub fn new(cause: impl Into<anyhow::Error>) -> Self {
        Self(cause.into())
    }

    fn not_configured() -> Self {
        Self(anyhow::anyhow!("no verifier capability configured"))
    }
}

/// Asks a wallet whether `payload` authorizes `hash` on its behalf.
#[cfg_attr(test, mockall::automock)]
pub trait WalletVerifier {
    fn check(
        &self,
        wallet: H160,
        hash: H256,
        payload: &[u8],
    ) -> Result<Vec<u8>, VerifierCallError>;
}

/// Asks a signer-approved third party validator whether `payload` authorizes
/// `hash` for `signer`.
#[cfg_attr(test, mockall::automock)]
pub trait ValidatorVerifier {
    fn check(
        &self,
        validator: H160,
        hash: H256,
        signer: H160,
        payload: &[u8],
    ) -> Result<Vec<u8>, VerifierCallError>;
}

/// Asks a wallet with the full structured message bytes instead of only
/// their hash, for verifiers that need complete context.
#[cfg_attr(test, mockall::automock)]
pub trait RichVerifier {
    fn check(
        &self,
        wallet: H160,
        message: &[u8],
        payload: &[u8],
    ) -> Result<Vec<u8>, VerifierCallError>;
}

enum Context<'a> {
    HashOnly,
    Full { message: &'a [u8] },
}

impl Exchange {
    /// Verifies a signature knowing only the 32 byte hash.
    ///
    /// Schemes that require the full structured message
    /// (`Validator`/`Eip1271Wallet`) are rejected with
    /// `InappropriateSignatureType`.
    pub fn verify_hash_signature(
        &self,
        hash: H256,
        signer: H160,
        signature: &[u8],
    ) -> Result<bool, ExchangeError> {
        self.verify_signature(hash, signer, signature, Context::HashOnly)
    }

    /// Verifies a signature for the order, with the maker as claimed signer.
    pub fn verify_order_signature(
        &self,
        order: &Order,
        signature: &[u8],
    ) -> Result<bool, ExchangeError> {
        let hash = order.hash(&self.domain_separator);
        let message = order.encode();
        self.verify_signature(
            hash,
            order.maker,
            signature,
            Context::Full { message: &message },
        )
    }

    /// Verifies a signature for the delegated transaction, with its signer
    /// as claimed signer.
    pub fn verify_transaction_signature(
        &self,
        transaction: &Transaction,
        signature: &[u8],
    ) -> Result<bool, ExchangeError> {
        let hash = transaction.hash(&self.domain_separator);
        let message = transaction.encode();
        self.verify_signature(
            hash,
            transaction.signer,
            signature,
            Context::Full { message: &message },
        )
    }

    fn verify_signature(
        &self,
        hash: H256,
        signer: H160,
        signature: &[u8],
        context: Context,
    ) -> Result<bool, ExchangeError> {
        if signer.is_zero() {
            return Err(ValidationError::InvalidSigner { hash }.into());
        }
        let decoded = Signature::from_bytes(signature).map_err(|err| match err {
            SignatureDecodeError::Empty | SignatureDecodeError::InvalidLength { .. } => {
                ValidationError::InvalidLength {
                    hash,
                    signer,
                    signature: signature.to_vec(),
                }
            }
            SignatureDecodeError::UnsupportedScheme(tag) => {
                ValidationError::UnsupportedScheme { hash, signer, tag }
            }
        })?;
        tracing::trace!(
            ?hash,
            ?signer,
            scheme = decoded.scheme().as_ref(),
            "verifying signature"
        );
        match decoded {
            Signature::Illegal => Err(ValidationError::IllegalScheme { hash, signer }.into()),
            Signature::Invalid => Ok(false),
            Signature::Eip712(ecdsa) => Ok(recovers_to(
                &ecdsa,
                EcdsaSigningScheme::Eip712,
                hash,
                signer,
            )),
            Signature::EthSign(ecdsa) => Ok(recovers_to(
                &ecdsa,
                EcdsaSigningScheme::EthSign,
                hash,
                signer,
            )),
            Signature::Wallet(payload) => self.check_wallet(
                hash,
                signer,
                &payload,
                matches!(context, Context::Full { .. }),
            ),
            Signature::Validator {
                validator,
                signature: payload,
            } => match context {
                Context::HashOnly => Err(ValidationError::InappropriateSignatureType {
                    hash,
                    scheme: SignatureScheme::Validator,
                }
                .into()),
                Context::Full { .. } => self.check_validator(hash, signer, validator, &payload),
            },
            Signature::PreSigned => Ok(self.is_presigned(signer, hash)),
            Signature::Eip1271Wallet(payload) => match context {
                Context::HashOnly => Err(ValidationError::InappropriateSignatureType {
                    hash,
                    scheme: SignatureScheme::Eip1271Wallet,
                }
                .into()),
                Context::Full { message } => self.check_rich(hash, signer, message, &payload),
            },
        }
    }

    fn check_wallet(
        &self,
        hash: H256,
        wallet: H160,
        payload: &[u8],
        strict: bool,
    ) -> Result<bool, ExchangeError> {
        let response = match &self.wallet_verifier {
            Some(verifier) => verifier.check(wallet, hash, payload),
            None => Err(VerifierCallError::not_configured()),
        };
        match response {
            Ok(bytes) => Ok(accepted(&bytes)),
            Err(source) if strict => {
                Err(AuthorizationError::WalletError {
                    hash,
                    wallet,
                    source,
                }
                .into())
            }
            Err(source) => {
                tracing::debug!(?hash, ?wallet, %source, "wallet verifier call failed");
                Ok(false)
            }
        }
    }

    fn check_validator(
        &self,
        hash: H256,
        signer: H160,
        validator: H160,
        payload: &[u8],
    ) -> Result<bool, ExchangeError> {
        if !self.is_validator_approved(signer, validator) {
            return Err(AuthorizationError::ValidatorNotApproved { signer, validator }.into());
        }
        let response = match &self.validator_verifier {
            Some(verifier) => verifier.check(validator, hash, signer, payload),
            None => Err(VerifierCallError::not_configured()),
        };
        match response {
            Ok(bytes) => Ok(accepted(&bytes)),
            Err(source) => Err(AuthorizationError::ValidatorError {
                hash,
                validator,
                source,
            }
            .into()),
        }
    }

    fn check_rich(
        &self,
        hash: H256,
        wallet: H160,
        message: &[u8],
        payload: &[u8],
    ) -> Result<bool, ExchangeError> {
        let response = match &self.rich_verifier {
            Some(verifier) => verifier.check(wallet, message, payload),
            None => Err(VerifierCallError::not_configured()),
        };
        match response {
            Ok(bytes) => Ok(accepted(&bytes)),
            Err(source) => Err(AuthorizationError::WalletError {
                hash,
                wallet,
                source,
            }
            .into()),
        }
    }
}

/// Recovery failure is a plain mismatch, not an error: a garbled signature
/// does not authorize anyone.
fn recovers_to(
    signature: &EcdsaSignature,
    scheme: EcdsaSigningScheme,
    hash: H256,
    signer: H160,
) -> bool {
    signature
        .recover(scheme, &hash.0)
        .map(|recovered| recovered == signer)
        .unwrap_or(false)
}

fn accepted(response: &[u8]) -> bool {
    response == &ACCEPTED_MARKER[..]
}
