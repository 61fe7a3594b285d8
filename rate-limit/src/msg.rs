//! Message types for the IBC rate limit contract
//!
//! Instantiation doubles as genesis: the initial policy is validated and stored
//! in one step. Updates are authority-only.

use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::Addr;

use crate::params::{Params, RateLimitConfig};
use crate::state::{Amount, Window};
use crate::timeframe::Timeframe;

// ============================================================================
// Instantiate & Migrate
// ============================================================================

/// Instantiate message
#[cw_serde]
pub struct InstantiateMsg {
    /// Governance authority allowed to update the policy
    pub authority: String,
    /// Average block time used to convert HOUR/DAY timeframes; defaults to 6
    pub block_time_seconds: Option<u64>,
    /// Initial policy
    #[serde(default)]
    pub params: Params,
}

/// Migrate message
#[cw_serde]
#[derive(Default)]
pub struct MigrateMsg {
    /// New average block time; the stored policy is re-validated against it
    pub block_time_seconds: Option<u64>,
}

// ============================================================================
// Execute Messages
// ============================================================================

/// Execute messages
///
/// Authorization: authority only.
#[cw_serde]
pub enum ExecuteMsg {
    /// Replace the whole policy
    UpdateParams { params: Params },

    /// Upsert one config keyed by exact (channel_id, denom)
    UpdateRateLimit { rate_limit: RateLimitConfig },

    /// Remove the config keyed by exact (channel_id, denom)
    RemoveRateLimit { channel_id: String, denom: String },
}

// ============================================================================
// Query Messages
// ============================================================================

/// Query messages
///
/// Counter queries report the value the admission check would see at the
/// current height: an expired window reads as zero.
#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(ConfigResponse)]
    Config {},

    #[returns(ParamsResponse)]
    Params {},

    /// First config matching (channel_id, denom)
    #[returns(Option<RateLimitConfig>)]
    RateLimit { channel_id: String, denom: String },

    #[returns(ChannelFlowResponse)]
    ChannelFlow {
        channel_id: String,
        denom: String,
        timeframe: Timeframe,
    },

    /// Flow tracked by the deprecated single-window limit
    #[returns(ChannelFlowResponse)]
    LegacyChannelFlow { channel_id: String, denom: String },

    #[returns(UniqueSendersResponse)]
    UniqueSenders {
        channel_id: String,
        timeframe: Timeframe,
    },

    #[returns(AddressTransfersResponse)]
    AddressTransfers {
        address: String,
        channel_id: String,
        denom: String,
        timeframe: Timeframe,
    },
}

// ============================================================================
// Query Responses
// ============================================================================

#[cw_serde]
pub struct ConfigResponse {
    pub authority: Addr,
    pub block_time_seconds: u64,
}

#[cw_serde]
pub struct ParamsResponse {
    pub params: Params,
}

#[cw_serde]
pub struct ChannelFlowResponse {
    pub net_flow: Amount,
    pub window: Window,
}

#[cw_serde]
pub struct UniqueSendersResponse {
    pub senders: Vec<String>,
    pub window: Window,
}

#[cw_serde]
pub struct AddressTransfersResponse {
    pub transfer_count: u64,
    pub total_amount: Amount,
    pub window: Window,
}
