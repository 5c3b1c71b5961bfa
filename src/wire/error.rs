//! Wire format errors.

use thiserror::Error;

/// Errors raised while decoding TLV blocks.
///
/// All of them are format errors: the offending message is discarded by the
/// endpoint that received it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("truncated TLV: {needed} more byte(s) required")]
    Truncated { needed: usize },
    #[error("unexpected TLV-TYPE {actual} when decoding {context} (expected {expected})")]
    UnexpectedType {
        context: &'static str,
        expected: u64,
        actual: u64,
    },
    #[error("TLV-LENGTH {0} exceeds addressable size")]
    LengthOverflow(u64),
    #[error("{0} trailing byte(s) after TLV block")]
    TrailingBytes(usize),
    #[error("invalid NonNegativeInteger length {0}")]
    InvalidIntegerLength(usize),
    #[error("empty IpPacketList")]
    EmptyIpPacketList,
    #[error("missing {0} element")]
    MissingField(&'static str),
    #[error("invalid control bits {0}")]
    InvalidControlBits(u64),
}
