//! Admission check.
//!
//! Rejection short-circuits on the first failing sub-limit and always
//! surfaces as `RateLimitExceeded`. The only writes are window roll-overs.

use cosmwasm_std::Storage;

use super::{active_legacy_limit, Clock, Transfer};
use crate::error::ContractError;
use crate::keys::{AddressKey, FlowKey, LegacyFlowKey, SendersKey};
use crate::params::RateLimitConfig;
use crate::state::{amount_abs, get_counter, reset_window, Amount};

/// Decide whether `transfer` fits every limit of `config`.
pub fn check_config(
    storage: &mut dyn Storage,
    clock: &Clock,
    config: &RateLimitConfig,
    transfer: &Transfer,
) -> Result<(), ContractError> {
    let signed_amount = transfer.signed_amount()?;

    if let Some(limit) = active_legacy_limit(config) {
        let key = LegacyFlowKey {
            channel_id: transfer.channel_id,
            denom: transfer.denom,
        };
        reset_window(
            storage,
            &key,
            clock.height,
            &limit.timeframe,
            clock.block_time_seconds,
        )?;
        let (flow, _) = get_counter(storage, &key)?;
        ensure_flow_within(flow.net_flow, signed_amount, limit.max_amount)?;
    }

    for limit in config
        .supply_shift_limits
        .iter()
        .filter(|l| l.max_amount > Amount::zero())
    {
        let key = FlowKey {
            channel_id: transfer.channel_id,
            denom: transfer.denom,
            timeframe: limit.timeframe,
        };
        reset_window(
            storage,
            &key,
            clock.height,
            &limit.timeframe,
            clock.block_time_seconds,
        )?;
        let (flow, _) = get_counter(storage, &key)?;
        ensure_flow_within(flow.net_flow, signed_amount, limit.max_amount)?;
    }

    // Unique senders are inflow-only
    if transfer.is_inflow && !transfer.sender.is_empty() {
        for limit in config
            .unique_sender_limits
            .iter()
            .filter(|l| l.max_unique_senders > 0)
        {
            let key = SendersKey {
                channel_id: transfer.channel_id,
                timeframe: limit.timeframe,
            };
            reset_window(
                storage,
                &key,
                clock.height,
                &limit.timeframe,
                clock.block_time_seconds,
            )?;
            let (seen, _) = get_counter(storage, &key)?;
            if seen.contains(transfer.sender) {
                continue;
            }
            if seen.len() as u64 >= limit.max_unique_senders as u64 {
                return Err(ContractError::RateLimitExceeded);
            }
        }
    }

    if !transfer.sender.is_empty() {
        let abs_amount = transfer.abs_amount()?;
        for limit in config
            .address_limits
            .iter()
            .filter(|l| l.max_transfers > 0 || l.max_amount > Amount::zero())
        {
            let key = AddressKey {
                address: transfer.sender,
                channel_id: transfer.channel_id,
                denom: transfer.denom,
                timeframe: limit.timeframe,
            };
            reset_window(
                storage,
                &key,
                clock.height,
                &limit.timeframe,
                clock.block_time_seconds,
            )?;
            let (data, _) = get_counter(storage, &key)?;

            if limit.max_transfers > 0
                && data.transfer_count.saturating_add(1) > limit.max_transfers as u64
            {
                return Err(ContractError::RateLimitExceeded);
            }
            if limit.max_amount > Amount::zero()
                && data.total_amount.checked_add(abs_amount)? > limit.max_amount
            {
                return Err(ContractError::RateLimitExceeded);
            }
        }
    }

    Ok(())
}

/// Reject when `|current + signed_amount|` exceeds `max`.
fn ensure_flow_within(
    current: Amount,
    signed_amount: Amount,
    max: Amount,
) -> Result<(), ContractError> {
    let new_flow = current.checked_add(signed_amount)?;
    if amount_abs(new_flow)? > max {
        return Err(ContractError::RateLimitExceeded);
    }
    Ok(())
}
