//! Post-commit tracker.
//!
//! Runs `reset -> read -> mutate -> write` for every limit family of the
//! matching config. Relies on the enclosing transaction for atomicity.

use cosmwasm_std::Storage;

use super::{active_legacy_limit, distinct_timeframes, Clock, Transfer};
use crate::error::ContractError;
use crate::keys::{AddressKey, FlowKey, LegacyFlowKey, SendersKey};
use crate::params::RateLimitConfig;
use crate::state::{get_counter, reset_window, set_counter, Amount};

/// Record a committed transfer against every limit of `config`.
pub fn track_config(
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
        let (mut flow, _) = get_counter(storage, &key)?;
        flow.net_flow = flow.net_flow.checked_add(signed_amount)?;
        set_counter(storage, &key, &flow)?;
    }

    let supply_timeframes = distinct_timeframes(
        config
            .supply_shift_limits
            .iter()
            .filter(|l| l.max_amount > Amount::zero())
            .map(|l| &l.timeframe),
    );
    for timeframe in supply_timeframes {
        let key = FlowKey {
            channel_id: transfer.channel_id,
            denom: transfer.denom,
            timeframe,
        };
        reset_window(
            storage,
            &key,
            clock.height,
            &timeframe,
            clock.block_time_seconds,
        )?;
        let (mut flow, _) = get_counter(storage, &key)?;
        flow.net_flow = flow.net_flow.checked_add(signed_amount)?;
        set_counter(storage, &key, &flow)?;
    }

    if transfer.is_inflow && !transfer.sender.is_empty() {
        let sender_timeframes = distinct_timeframes(
            config
                .unique_sender_limits
                .iter()
                .filter(|l| l.max_unique_senders > 0)
                .map(|l| &l.timeframe),
        );
        for timeframe in sender_timeframes {
            let key = SendersKey {
                channel_id: transfer.channel_id,
                timeframe,
            };
            reset_window(
                storage,
                &key,
                clock.height,
                &timeframe,
                clock.block_time_seconds,
            )?;
            let (mut seen, _) = get_counter(storage, &key)?;
            if seen.insert(transfer.sender) {
                set_counter(storage, &key, &seen)?;
            }
        }
    }

    if !transfer.sender.is_empty() {
        let abs_amount = transfer.abs_amount()?;
        let address_timeframes = distinct_timeframes(
            config
                .address_limits
                .iter()
                .filter(|l| l.max_transfers > 0 || l.max_amount > Amount::zero())
                .map(|l| &l.timeframe),
        );
        for timeframe in address_timeframes {
            let key = AddressKey {
                address: transfer.sender,
                channel_id: transfer.channel_id,
                denom: transfer.denom,
                timeframe,
            };
            reset_window(
                storage,
                &key,
                clock.height,
                &timeframe,
                clock.block_time_seconds,
            )?;
            let (mut data, _) = get_counter(storage, &key)?;
            data.transfer_count = data.transfer_count.saturating_add(1);
            data.total_amount = data.total_amount.checked_add(abs_amount)?;
            set_counter(storage, &key, &data)?;
        }
    }

    Ok(())
}
