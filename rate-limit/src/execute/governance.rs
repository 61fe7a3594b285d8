//! Policy update handlers.
//!
//! Every handler checks the signer against the configured authority, builds
//! the new `Params`, validates all of it and only then writes. A failed update
//! leaves the stored policy untouched.

use cosmwasm_std::{DepsMut, MessageInfo, Response};

use crate::error::ContractError;
use crate::params::{Params, RateLimitConfig};
use crate::state::{Config, CONFIG, PARAMS};

fn ensure_authority(config: &Config, info: &MessageInfo) -> Result<(), ContractError> {
    if info.sender != config.authority {
        return Err(ContractError::InvalidSigner);
    }
    Ok(())
}

/// Replace the whole policy.
pub fn execute_update_params(
    deps: DepsMut,
    info: MessageInfo,
    params: Params,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_authority(&config, &info)?;

    params.validate(config.block_time_seconds)?;
    PARAMS.save(deps.storage, &params)?;

    Ok(Response::new()
        .add_attribute("method", "update_params")
        .add_attribute("rate_limits", params.rate_limits.len().to_string()))
}

/// Upsert one config by exact (channel_id, denom).
pub fn execute_update_rate_limit(
    deps: DepsMut,
    info: MessageInfo,
    rate_limit: RateLimitConfig,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_authority(&config, &info)?;

    let channel_id = rate_limit.channel_id.clone();
    let denom = rate_limit.denom.clone();

    let mut params = PARAMS.may_load(deps.storage)?.unwrap_or_default();
    let replaced = params.upsert(rate_limit);
    params.validate(config.block_time_seconds)?;
    PARAMS.save(deps.storage, &params)?;

    Ok(Response::new()
        .add_attribute("method", "update_rate_limit")
        .add_attribute("channel_id", channel_id)
        .add_attribute("denom", denom)
        .add_attribute("replaced", replaced.to_string()))
}

/// Remove the config keyed by exact (channel_id, denom).
pub fn execute_remove_rate_limit(
    deps: DepsMut,
    info: MessageInfo,
    channel_id: String,
    denom: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_authority(&config, &info)?;

    let mut params = PARAMS.may_load(deps.storage)?.unwrap_or_default();
    if params.remove(&channel_id, &denom).is_none() {
        return Err(ContractError::RateLimitNotFound { channel_id, denom });
    }
    PARAMS.save(deps.storage, &params)?;

    Ok(Response::new()
        .add_attribute("method", "remove_rate_limit")
        .add_attribute("channel_id", channel_id)
        .add_attribute("denom", denom))
}
