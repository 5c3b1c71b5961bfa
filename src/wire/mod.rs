//! 线上编码模块
//!
//! TLV 原语、封装包（IPoC packet）以及 IP 包列表，客户端与网关共用。

mod error;
mod ip_packet_list;
mod ipoc_packet;
pub mod tlv;

pub use error::WireError;
pub use ip_packet_list::IpPacketList;
pub use ipoc_packet::{ControlSignal, IpocPacket};
pub use tlv::{Block, Encoder};
