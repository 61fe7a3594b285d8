//! ICS-20 - Shared Fungible Token Transfer Types
//!
//! This package provides the ICS-20 v1 packet payload, the standard
//! acknowledgement envelope and the denom trace helpers used by the
//! IBC rate limit middleware.

pub mod ack;
pub mod denom;
pub mod packet;

pub use ack::Acknowledgement;
pub use denom::{
    ibc_denom, receiver_chain_is_source, recv_local_denom, send_local_denom, DenomTrace,
};
pub use packet::FungibleTokenPacketData;
