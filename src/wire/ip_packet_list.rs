//! IP 包列表
//!
//! ```text
//! IpPacketList ::= IP-PACKET-LIST-TYPE TLV-LENGTH IpPacket+
//! IpPacket     ::= IP-PACKET-TYPE TLV-LENGTH RAW-BYTES
//! ```

use bytes::Bytes;

use super::tlv::{types, Block, Encoder};
use super::WireError;

/// 一个或多个完整 IP 包组成的有序列表（构造时保证非空）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpPacketList {
    pkts: Vec<Bytes>,
}

impl IpPacketList {
    /// 由若干 IP 包构造；列表为空时返回错误。
    pub fn new(pkts: Vec<Bytes>) -> Result<Self, WireError> {
        if pkts.is_empty() {
            return Err(WireError::EmptyIpPacketList);
        }
        Ok(Self { pkts })
    }

    pub fn single(pkt: Bytes) -> Self {
        Self { pkts: vec![pkt] }
    }

    pub fn push(&mut self, pkt: Bytes) {
        self.pkts.push(pkt);
    }

    pub fn len(&self) -> usize {
        self.pkts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pkts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bytes> + '_ {
        self.pkts.iter()
    }

    pub fn prepend_to(&self, enc: &mut Encoder) -> usize {
        let mut total = 0;
        for pkt in self.pkts.iter().rev() {
            total += enc.prepend_block_value(types::IP_PACKET, pkt);
        }
        total + enc.prepend_header(types::IP_PACKET_LIST, total)
    }

    pub fn wire_encode(&self) -> Bytes {
        let mut enc = Encoder::new();
        self.prepend_to(&mut enc);
        enc.finish()
    }

    pub fn wire_decode(block: &Block) -> Result<Self, WireError> {
        block.expect_type(types::IP_PACKET_LIST, "IpPacketList")?;
        let mut pkts = Vec::new();
        for element in block.elements()? {
            element.expect_type(types::IP_PACKET, "IpPacket")?;
            pkts.push(element.into_value());
        }
        Self::new(pkts)
    }
}

impl IntoIterator for IpPacketList {
    type Item = Bytes;
    type IntoIter = std::vec::IntoIter<Bytes>;

    fn into_iter(self) -> Self::IntoIter {
        self.pkts.into_iter()
    }
}
