//! Error types for the IBC rate limit middleware

use cosmwasm_std::{OverflowError, StdError};
use thiserror::Error;

/// Tag prefixed to every error acknowledgement produced by the middleware
pub const MODULE_TAG: &str = "ibc-rate-limit";

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Overflow(#[from] OverflowError),

    // ========================================================================
    // Admission
    // ========================================================================

    /// The only admission failure; which sub-limit fired is not reported.
    #[error("rate limit exceeded")]
    RateLimitExceeded,

    // ========================================================================
    // Governance
    // ========================================================================

    #[error("invalid signer: only the authority can update rate limits")]
    InvalidSigner,

    #[error("invalid params: {reason}")]
    InvalidParams { reason: String },

    #[error("rate limit not found for channel {channel_id:?} denom {denom:?}")]
    RateLimitNotFound { channel_id: String, denom: String },

    // ========================================================================
    // Codec
    // ========================================================================

    #[error("invalid timeframe")]
    InvalidTimeframe,

    #[error("invalid key component")]
    InvalidKeyComponent,

    #[error("decode error: {reason}")]
    Decode { reason: String },
}

impl ContractError {
    /// Reason string carried by an error acknowledgement.
    pub fn ack_reason(&self) -> String {
        format!("{}: {}", MODULE_TAG, self)
    }
}
