//! IBC Rate Limit Contract - Entry Points
//!
//! The contract owns the policy and the counters. The middleware in
//! `crate::middleware` reads both from the same store when packets flow.
//! - `execute/` - Governance handlers
//! - `query` - Policy and counter queries

use cosmwasm_std::{
    entry_point, to_json_binary, Binary, Deps, DepsMut, Env, MessageInfo, Response, StdResult,
};
use cw2::set_contract_version;

use crate::error::ContractError;
use crate::execute::{execute_remove_rate_limit, execute_update_params, execute_update_rate_limit};
use crate::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg};
use crate::query::{
    query_address_transfers, query_channel_flow, query_config, query_legacy_channel_flow,
    query_params, query_rate_limit, query_unique_senders,
};
use crate::state::{
    Config, CONFIG, CONTRACT_NAME, CONTRACT_VERSION, DEFAULT_BLOCK_TIME_SECONDS, PARAMS,
};

fn validate_block_time(block_time_seconds: u64) -> Result<u64, ContractError> {
    if block_time_seconds == 0 {
        return Err(ContractError::InvalidParams {
            reason: "block_time_seconds must be positive".to_string(),
        });
    }
    Ok(block_time_seconds)
}

// ============================================================================
// Instantiate
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let authority = deps.api.addr_validate(&msg.authority)?;
    let block_time_seconds =
        validate_block_time(msg.block_time_seconds.unwrap_or(DEFAULT_BLOCK_TIME_SECONDS))?;

    // Genesis policy goes through the same validation as updates
    msg.params.validate(block_time_seconds)?;

    CONFIG.save(
        deps.storage,
        &Config {
            authority: authority.clone(),
            block_time_seconds,
        },
    )?;
    PARAMS.save(deps.storage, &msg.params)?;

    Ok(Response::new()
        .add_attribute("method", "instantiate")
        .add_attribute("authority", authority)
        .add_attribute("block_time_seconds", block_time_seconds.to_string())
        .add_attribute("rate_limits", msg.params.rate_limits.len().to_string()))
}

// ============================================================================
// Execute
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::UpdateParams { params } => execute_update_params(deps, info, params),
        ExecuteMsg::UpdateRateLimit { rate_limit } => {
            execute_update_rate_limit(deps, info, rate_limit)
        }
        ExecuteMsg::RemoveRateLimit { channel_id, denom } => {
            execute_remove_rate_limit(deps, info, channel_id, denom)
        }
    }
}

// ============================================================================
// Query
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => to_json_binary(&query_config(deps)?),
        QueryMsg::Params {} => to_json_binary(&query_params(deps)?),
        QueryMsg::RateLimit { channel_id, denom } => {
            to_json_binary(&query_rate_limit(deps, channel_id, denom)?)
        }
        QueryMsg::ChannelFlow {
            channel_id,
            denom,
            timeframe,
        } => to_json_binary(&query_channel_flow(deps, env, channel_id, denom, timeframe)?),
        QueryMsg::LegacyChannelFlow { channel_id, denom } => {
            to_json_binary(&query_legacy_channel_flow(deps, env, channel_id, denom)?)
        }
        QueryMsg::UniqueSenders {
            channel_id,
            timeframe,
        } => to_json_binary(&query_unique_senders(deps, env, channel_id, timeframe)?),
        QueryMsg::AddressTransfers {
            address,
            channel_id,
            denom,
            timeframe,
        } => to_json_binary(&query_address_transfers(
            deps, env, address, channel_id, denom, timeframe,
        )?),
    }
}

// ============================================================================
// Migrate
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(deps: DepsMut, _env: Env, msg: MigrateMsg) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let mut config = CONFIG.load(deps.storage)?;
    if let Some(block_time_seconds) = msg.block_time_seconds {
        config.block_time_seconds = validate_block_time(block_time_seconds)?;
    }

    // Stored timeframes must still convert to at least one block
    let params = PARAMS.may_load(deps.storage)?.unwrap_or_default();
    params.validate(config.block_time_seconds)?;
    PARAMS.save(deps.storage, &params)?;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("version", CONTRACT_VERSION)
        .add_attribute("block_time_seconds", config.block_time_seconds.to_string()))
}
