//! Transfer middleware.
//!
//! [`RateLimitMiddleware`] wraps an inner ICS-20 application and overrides its
//! receive and send entry points:
//!
//! 1. Decode the packet as ICS-20. Anything that does not decode, or whose
//!    amount does not parse, goes to the inner application untouched.
//! 2. Canonicalize the denom to the local form held in balances.
//! 3. Run the admission check. A rejection never reaches the inner app.
//! 4. Call the inner app inside an [`AtomicContext`]. On success the transfer
//!    is tracked in the same context and committed; on failure every write is
//!    rolled back and counters stay untouched.

use cosmwasm_std::{Addr, Binary, Env, Event, IbcPacket, IbcTimeout, Storage};
use ics20::{recv_local_denom, send_local_denom, Acknowledgement, FungibleTokenPacketData};

use crate::atomic::{AtomicContext, StateHandle};
use crate::error::ContractError;
use crate::limiter::{self, Transfer};
use crate::state::Amount;

/// Event type emitted for every packet seen by the middleware
pub const EVENT_TYPE: &str = "ibc_rate_limit";

/// The ICS-20 application sitting below the middleware.
pub trait TransferApp {
    /// Handle an inbound packet and produce its acknowledgement.
    fn on_recv_packet(
        &mut self,
        storage: &mut dyn Storage,
        env: &Env,
        packet: &IbcPacket,
        relayer: &Addr,
    ) -> Acknowledgement;

    /// Commit an outbound packet and return its sequence.
    fn send_packet(
        &mut self,
        storage: &mut dyn Storage,
        env: &Env,
        source_port: &str,
        source_channel: &str,
        timeout: &IbcTimeout,
        data: &Binary,
    ) -> Result<u64, ContractError>;
}

/// Terminal state of one packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacketVerdict {
    /// Not an ICS-20 transfer; handed to the inner app without checks
    PassThrough,
    /// Admission refused; inner app not called, counters unchanged
    Reject,
    /// Inner app succeeded and the transfer was tracked
    Commit,
    /// Admission passed but the inner app failed; its writes were discarded
    InnerFail,
}

impl PacketVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            PacketVerdict::PassThrough => "pass_through",
            PacketVerdict::Reject => "reject",
            PacketVerdict::Commit => "commit",
            PacketVerdict::InnerFail => "inner_fail",
        }
    }
}

/// What the middleware hands back to the transport.
#[derive(Clone, Debug, PartialEq)]
pub struct PacketResult<T> {
    pub verdict: PacketVerdict,
    /// Acknowledgement for receives, sequence or error for sends
    pub outcome: T,
    pub events: Vec<Event>,
}

pub type RecvResult = PacketResult<Acknowledgement>;
pub type SendResult = PacketResult<Result<u64, ContractError>>;

pub struct RateLimitMiddleware<A> {
    app: A,
}

impl<A: TransferApp> RateLimitMiddleware<A> {
    pub fn new(app: A) -> Self {
        RateLimitMiddleware { app }
    }

    pub fn app(&self) -> &A {
        &self.app
    }

    pub fn app_mut(&mut self) -> &mut A {
        &mut self.app
    }

    pub fn into_inner(self) -> A {
        self.app
    }

    // ========================================================================
    // Receive
    // ========================================================================

    pub fn on_recv_packet(
        &mut self,
        mut state: StateHandle<'_>,
        env: &Env,
        packet: &IbcPacket,
        relayer: &Addr,
    ) -> RecvResult {
        const ACTION: &str = "recv_packet";
        let channel_id = packet.dest.channel_id.as_str();

        // Decode failures are left to the inner app
        let (data, amount) = match parse_transfer(&packet.data) {
            Ok(parsed) => parsed,
            Err(_) => {
                let ack = self.app.on_recv_packet(&mut state, env, packet, relayer);
                return PacketResult {
                    verdict: PacketVerdict::PassThrough,
                    outcome: ack,
                    events: vec![packet_event(ACTION, PacketVerdict::PassThrough, channel_id, None)],
                };
            }
        };

        let local_denom = recv_local_denom(
            &packet.src.port_id,
            &packet.src.channel_id,
            &packet.dest.port_id,
            &packet.dest.channel_id,
            &data.denom,
        );
        let transfer = Transfer {
            channel_id,
            denom: &local_denom,
            amount,
            is_inflow: true,
            sender: &data.sender,
        };
        let height = env.block.height;

        let reject = |err: ContractError| PacketResult {
            verdict: PacketVerdict::Reject,
            outcome: Acknowledgement::error(err.ack_reason()),
            events: vec![packet_event(ACTION, PacketVerdict::Reject, channel_id, Some(&transfer))],
        };

        if let Err(err) = limiter::check(&mut state, height, &transfer) {
            return reject(err);
        }

        let mut ctx = AtomicContext::acquire(state);
        let ack = self.app.on_recv_packet(&mut ctx, env, packet, relayer);

        if !ack.is_success() {
            let outcome = match ctx.rollback() {
                Ok(()) => ack,
                Err(err) => Acknowledgement::error(ContractError::from(err).ack_reason()),
            };
            return PacketResult {
                verdict: PacketVerdict::InnerFail,
                outcome,
                events: vec![packet_event(
                    ACTION,
                    PacketVerdict::InnerFail,
                    channel_id,
                    Some(&transfer),
                )],
            };
        }

        match track_and_commit(&mut ctx, height, &transfer) {
            Ok(()) => PacketResult {
                verdict: PacketVerdict::Commit,
                outcome: ack,
                events: vec![packet_event(ACTION, PacketVerdict::Commit, channel_id, Some(&transfer))],
            },
            // ctx rolls back on drop
            Err(err) => reject(err),
        }
    }

    // ========================================================================
    // Send
    // ========================================================================

    pub fn send_packet(
        &mut self,
        mut state: StateHandle<'_>,
        env: &Env,
        source_port: &str,
        source_channel: &str,
        timeout: &IbcTimeout,
        data: &Binary,
    ) -> SendResult {
        const ACTION: &str = "send_packet";

        let (packet_data, amount) = match parse_transfer(data) {
            Ok(parsed) => parsed,
            Err(_) => {
                let sequence = self.app.send_packet(
                    &mut state,
                    env,
                    source_port,
                    source_channel,
                    timeout,
                    data,
                );
                return PacketResult {
                    verdict: PacketVerdict::PassThrough,
                    outcome: sequence,
                    events: vec![packet_event(
                        ACTION,
                        PacketVerdict::PassThrough,
                        source_channel,
                        None,
                    )],
                };
            }
        };

        let local_denom = send_local_denom(&packet_data.denom);
        let transfer = Transfer {
            channel_id: source_channel,
            denom: &local_denom,
            amount,
            is_inflow: false,
            sender: &packet_data.sender,
        };
        let height = env.block.height;

        let reject = |err: ContractError| PacketResult {
            verdict: PacketVerdict::Reject,
            outcome: Err(err),
            events: vec![packet_event(
                ACTION,
                PacketVerdict::Reject,
                source_channel,
                Some(&transfer),
            )],
        };

        if let Err(err) = limiter::check(&mut state, height, &transfer) {
            return reject(err);
        }

        let mut ctx = AtomicContext::acquire(state);
        let sequence = match self.app.send_packet(
            &mut ctx,
            env,
            source_port,
            source_channel,
            timeout,
            data,
        ) {
            Ok(sequence) => sequence,
            Err(err) => {
                let outcome = match ctx.rollback() {
                    Ok(()) => Err(err),
                    Err(revert_err) => Err(ContractError::from(revert_err)),
                };
                return PacketResult {
                    verdict: PacketVerdict::InnerFail,
                    outcome,
                    events: vec![packet_event(
                        ACTION,
                        PacketVerdict::InnerFail,
                        source_channel,
                        Some(&transfer),
                    )],
                };
            }
        };

        match track_and_commit(&mut ctx, height, &transfer) {
            Ok(()) => PacketResult {
                verdict: PacketVerdict::Commit,
                outcome: Ok(sequence),
                events: vec![packet_event(
                    ACTION,
                    PacketVerdict::Commit,
                    source_channel,
                    Some(&transfer),
                )],
            },
            Err(err) => reject(err),
        }
    }
}

/// ICS-20 payload and its parsed amount, widened to the signed counter type.
fn parse_transfer(data: &Binary) -> Result<(FungibleTokenPacketData, Amount), ContractError> {
    let decode_err = |err: cosmwasm_std::StdError| ContractError::Decode {
        reason: err.to_string(),
    };
    let packet_data = FungibleTokenPacketData::decode(data.as_slice()).map_err(decode_err)?;
    let amount = packet_data.parse_amount().map_err(decode_err)?;
    Ok((packet_data, Amount::from(amount)))
}

fn track_and_commit(
    ctx: &mut AtomicContext,
    height: u64,
    transfer: &Transfer,
) -> Result<(), ContractError> {
    limiter::track(&mut *ctx, height, transfer)?;
    ctx.commit()?;
    Ok(())
}

fn packet_event(
    action: &str,
    verdict: PacketVerdict,
    channel_id: &str,
    transfer: Option<&Transfer>,
) -> Event {
    let event = Event::new(EVENT_TYPE)
        .add_attribute("action", action)
        .add_attribute("verdict", verdict.as_str())
        .add_attribute("channel", channel_id);
    match transfer {
        Some(transfer) => event
            .add_attribute("denom", transfer.denom)
            .add_attribute("amount", transfer.amount.to_string()),
        None => event,
    }
}
