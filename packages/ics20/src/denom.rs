//! Denom trace helpers.
//!
//! A token whose canonical chain is elsewhere is held locally under
//! `ibc/{SHA256(full_trace)}` where `full_trace` is `port/channel/.../base`.
//! Native tokens keep their base denom.

use sha2::{Digest, Sha256};

/// Prefix of hashed IBC denoms
pub const IBC_DENOM_PREFIX: &str = "ibc";

/// Compute `ibc/{HEX}` for a full denom trace.
pub fn ibc_denom(full_trace: &str) -> String {
    let hash = Sha256::digest(full_trace.as_bytes());
    format!("{}/{}", IBC_DENOM_PREFIX, hex::encode_upper(hash))
}

/// Trace prefix added by a hop: `port/channel/`
pub fn trace_prefix(port_id: &str, channel_id: &str) -> String {
    format!("{}/{}/", port_id, channel_id)
}

/// True when the denom was previously prefixed by the given source
/// port/channel, i.e. the token is travelling back towards its origin.
pub fn receiver_chain_is_source(source_port: &str, source_channel: &str, denom: &str) -> bool {
    denom.starts_with(&trace_prefix(source_port, source_channel))
}

/// Channel identifiers assigned by the transport: `channel-{u64}`.
fn is_channel_id(segment: &str) -> bool {
    segment
        .strip_prefix("channel-")
        .map(|n| !n.is_empty() && n.parse::<u64>().is_ok())
        .unwrap_or(false)
}

/// A denom split into its hop path and base denom.
///
/// Hops are recognised as `port/channel-N` pairs from the left; the rest is
/// the base denom, which may itself contain `/` (e.g. `gamm/pool/1`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DenomTrace {
    pub path: String,
    pub base_denom: String,
}

impl DenomTrace {
    pub fn parse(full_denom: &str) -> Self {
        let segments: Vec<&str> = full_denom.split('/').collect();
        let length = segments.len();

        let mut path: Vec<&str> = Vec::new();
        let mut i = 0;
        while length > 2 && i + 1 < length && is_channel_id(segments[i + 1]) {
            path.push(segments[i]);
            path.push(segments[i + 1]);
            i += 2;
        }

        DenomTrace {
            path: path.join("/"),
            base_denom: segments[i..].join("/"),
        }
    }

    pub fn has_path(&self) -> bool {
        !self.path.is_empty()
    }

    pub fn full_path(&self) -> String {
        if self.has_path() {
            format!("{}/{}", self.path, self.base_denom)
        } else {
            self.base_denom.clone()
        }
    }

    /// Local denom: the base denom for native tokens, the hashed form otherwise.
    pub fn ibc_denom(&self) -> String {
        if self.has_path() {
            ibc_denom(&self.full_path())
        } else {
            self.base_denom.clone()
        }
    }
}

/// Local denom of a token arriving on `dest_port/dest_channel` from
/// `source_port/source_channel`.
///
/// When this chain is the token's source the sender's hop prefix is stripped;
/// otherwise the receiving hop is prepended. Any remaining path is reduced to
/// its hashed form.
pub fn recv_local_denom(
    source_port: &str,
    source_channel: &str,
    dest_port: &str,
    dest_channel: &str,
    denom: &str,
) -> String {
    if receiver_chain_is_source(source_port, source_channel, denom) {
        let unprefixed = &denom[trace_prefix(source_port, source_channel).len()..];
        DenomTrace::parse(unprefixed).ibc_denom()
    } else {
        let prefixed = format!("{}{}", trace_prefix(dest_port, dest_channel), denom);
        DenomTrace::parse(&prefixed).ibc_denom()
    }
}

/// Local denom of a token leaving through `source_port/source_channel`.
///
/// The packet carries the full trace. A voucher being redeemed towards its
/// origin still sits in local balances under the hash of that full trace,
/// as does any other voucher; native tokens keep their base denom.
pub fn send_local_denom(denom: &str) -> String {
    DenomTrace::parse(denom).ibc_denom()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATOM_ON_OSMOSIS: &str =
        "ibc/27394FB092D2ECCD56123C74F36E4C1F926001CEADA9CA97EA622B25F41E5EB2";

    #[test]
    fn test_ibc_denom_matches_known_hash() {
        assert_eq!(ibc_denom("transfer/channel-0/uatom"), ATOM_ON_OSMOSIS);
    }

    #[test]
    fn test_parse_trace() {
        let trace = DenomTrace::parse("transfer/channel-0/uatom");
        assert_eq!(trace.path, "transfer/channel-0");
        assert_eq!(trace.base_denom, "uatom");

        let multi = DenomTrace::parse("transfer/channel-1/transfer/channel-0/uatom");
        assert_eq!(multi.path, "transfer/channel-1/transfer/channel-0");
        assert_eq!(multi.base_denom, "uatom");

        let native = DenomTrace::parse("uosmo");
        assert!(!native.has_path());
        assert_eq!(native.ibc_denom(), "uosmo");

        // Slashes in a native base denom are not a hop path
        let pool = DenomTrace::parse("gamm/pool/1");
        assert!(!pool.has_path());
        assert_eq!(pool.ibc_denom(), "gamm/pool/1");

        let nested = DenomTrace::parse("transfer/channel-3/gamm/pool/1");
        assert_eq!(nested.path, "transfer/channel-3");
        assert_eq!(nested.base_denom, "gamm/pool/1");
    }

    #[test]
    fn test_receiver_chain_is_source() {
        assert!(receiver_chain_is_source("transfer", "channel-0", "transfer/channel-0/uosmo"));
        assert!(!receiver_chain_is_source("transfer", "channel-0", "transfer/channel-01/uosmo"));
        assert!(!receiver_chain_is_source("transfer", "channel-0", "uatom"));
    }

    #[test]
    fn test_recv_local_denom_sink() {
        // uatom sent from the hub over its channel-141 arrives on our channel-0
        let local = recv_local_denom("transfer", "channel-141", "transfer", "channel-0", "uatom");
        assert_eq!(local, ATOM_ON_OSMOSIS);
    }

    #[test]
    fn test_recv_local_denom_source() {
        // Our native uosmo returning home
        let local = recv_local_denom(
            "transfer",
            "channel-141",
            "transfer",
            "channel-0",
            "transfer/channel-141/uosmo",
        );
        assert_eq!(local, "uosmo");

        // A third-chain voucher returning over the same hop keeps its hash form
        let local = recv_local_denom(
            "transfer",
            "channel-141",
            "transfer",
            "channel-0",
            "transfer/channel-141/transfer/channel-0/uatom",
        );
        assert_eq!(local, ATOM_ON_OSMOSIS);
    }

    #[test]
    fn test_send_local_denom() {
        assert_eq!(send_local_denom("uosmo"), "uosmo");
        assert_eq!(send_local_denom("transfer/channel-0/uatom"), ATOM_ON_OSMOSIS);
    }
}
