//! Query handlers for the IBC rate limit contract.
//!
//! Counter queries never write: they report what the admission check would
//! see at the current height, so an expired window reads as zero.

use cosmwasm_std::{Deps, Env, StdError, StdResult};

use crate::error::ContractError;
use crate::keys::{AddressKey, FlowKey, LegacyFlowKey, SendersKey};
use crate::limiter::active_legacy_limit;
use crate::msg::{
    AddressTransfersResponse, ChannelFlowResponse, ConfigResponse, ParamsResponse,
    UniqueSendersResponse,
};
use crate::params::RateLimitConfig;
use crate::state::{
    effective_counter, get_counter, get_window, Window, CONFIG, DEFAULT_BLOCK_TIME_SECONDS,
    PARAMS,
};
use crate::timeframe::Timeframe;

fn to_std(err: ContractError) -> StdError {
    match err {
        ContractError::Std(err) => err,
        other => StdError::generic_err(other.to_string()),
    }
}

fn block_time_seconds(deps: Deps) -> StdResult<u64> {
    Ok(CONFIG
        .may_load(deps.storage)?
        .map(|c| c.block_time_seconds)
        .unwrap_or(DEFAULT_BLOCK_TIME_SECONDS))
}

// ============================================================================
// Policy Queries
// ============================================================================

pub fn query_config(deps: Deps) -> StdResult<ConfigResponse> {
    let config = CONFIG.load(deps.storage)?;
    Ok(ConfigResponse {
        authority: config.authority,
        block_time_seconds: config.block_time_seconds,
    })
}

pub fn query_params(deps: Deps) -> StdResult<ParamsResponse> {
    Ok(ParamsResponse {
        params: PARAMS.may_load(deps.storage)?.unwrap_or_default(),
    })
}

/// First config matching (channel_id, denom), wildcards included.
pub fn query_rate_limit(
    deps: Deps,
    channel_id: String,
    denom: String,
) -> StdResult<Option<RateLimitConfig>> {
    let params = PARAMS.may_load(deps.storage)?.unwrap_or_default();
    Ok(params.find_matching_config(&channel_id, &denom).cloned())
}

// ============================================================================
// Counter Queries
// ============================================================================

pub fn query_channel_flow(
    deps: Deps,
    env: Env,
    channel_id: String,
    denom: String,
    timeframe: Timeframe,
) -> StdResult<ChannelFlowResponse> {
    let key = FlowKey {
        channel_id: &channel_id,
        denom: &denom,
        timeframe,
    };
    let (flow, window) = effective_counter(
        deps.storage,
        &key,
        env.block.height,
        &timeframe,
        block_time_seconds(deps)?,
    )
    .map_err(to_std)?;
    Ok(ChannelFlowResponse {
        net_flow: flow.net_flow,
        window,
    })
}

/// Legacy flow, evaluated against the active legacy limit of the matching config.
///
/// Without an active one the admission check never rolls this window over, so
/// the stored values are returned as-is.
pub fn query_legacy_channel_flow(
    deps: Deps,
    env: Env,
    channel_id: String,
    denom: String,
) -> StdResult<ChannelFlowResponse> {
    let key = LegacyFlowKey {
        channel_id: &channel_id,
        denom: &denom,
    };
    let params = PARAMS.may_load(deps.storage)?.unwrap_or_default();
    let legacy_timeframe = params
        .find_matching_config(&channel_id, &denom)
        .and_then(active_legacy_limit)
        .map(|l| l.timeframe);

    let (flow, window) = match legacy_timeframe {
        Some(timeframe) => effective_counter(
            deps.storage,
            &key,
            env.block.height,
            &timeframe,
            block_time_seconds(deps)?,
        )
        .map_err(to_std)?,
        None => {
            let (flow, _) = get_counter(deps.storage, &key).map_err(to_std)?;
            let window = get_window(deps.storage, &key)
                .map_err(to_std)?
                .unwrap_or(Window {
                    window_start: env.block.height,
                    window_duration: 0,
                });
            (flow, window)
        }
    };
    Ok(ChannelFlowResponse {
        net_flow: flow.net_flow,
        window,
    })
}

pub fn query_unique_senders(
    deps: Deps,
    env: Env,
    channel_id: String,
    timeframe: Timeframe,
) -> StdResult<UniqueSendersResponse> {
    let key = SendersKey {
        channel_id: &channel_id,
        timeframe,
    };
    let (seen, window) = effective_counter(
        deps.storage,
        &key,
        env.block.height,
        &timeframe,
        block_time_seconds(deps)?,
    )
    .map_err(to_std)?;
    Ok(UniqueSendersResponse {
        senders: seen.senders,
        window,
    })
}

pub fn query_address_transfers(
    deps: Deps,
    env: Env,
    address: String,
    channel_id: String,
    denom: String,
    timeframe: Timeframe,
) -> StdResult<AddressTransfersResponse> {
    let key = AddressKey {
        address: &address,
        channel_id: &channel_id,
        denom: &denom,
        timeframe,
    };
    let (data, window) = effective_counter(
        deps.storage,
        &key,
        env.block.height,
        &timeframe,
        block_time_seconds(deps)?,
    )
    .map_err(to_std)?;
    Ok(AddressTransfersResponse {
        transfer_count: data.transfer_count,
        total_amount: data.total_amount,
        window,
    })
}
