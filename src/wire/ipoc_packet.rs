//! 封装包（IPoC packet）
//!
//! 作为 Data 的 Content 携带：
//!
//! ```text
//! IpocPacket     ::= CONTENT-TYPE TLV-LENGTH
//!                      ControlBits SequenceNumber [IpPacketList]
//! ControlBits    ::= 1 TLV-LENGTH NonNegativeInteger   (0 / 1 / 3)
//! SequenceNumber ::= 2 TLV-LENGTH NonNegativeInteger
//! ```

use bytes::Bytes;

use super::ip_packet_list::IpPacketList;
use super::tlv::{types, Block, Encoder};
use super::WireError;

/// 信用调整信号（IDR），线上取值 0 / 1 / 3。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum ControlSignal {
    #[default]
    NoChange,
    Increase,
    Decrease,
}

impl ControlSignal {
    pub fn bits(self) -> u8 {
        match self {
            ControlSignal::NoChange => 0,
            ControlSignal::Increase => 1,
            // 0b11
            ControlSignal::Decrease => 3,
        }
    }

    pub fn from_bits(bits: u64) -> Result<Self, WireError> {
        match bits {
            0 => Ok(ControlSignal::NoChange),
            1 => Ok(ControlSignal::Increase),
            3 => Ok(ControlSignal::Decrease),
            other => Err(WireError::InvalidControlBits(other)),
        }
    }

    /// 对客户端信用计数的调整量
    pub fn credit_delta(self) -> i64 {
        match self {
            ControlSignal::NoChange => 0,
            ControlSignal::Increase => 1,
            ControlSignal::Decrease => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IpocPacket {
    control: ControlSignal,
    sequence_number: u64,
    payload: Option<IpPacketList>,
}

impl IpocPacket {
    pub fn new(control: ControlSignal, sequence_number: u64) -> Self {
        Self {
            control,
            sequence_number,
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: IpPacketList) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn control(&self) -> ControlSignal {
        self.control
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn payload(&self) -> Option<&IpPacketList> {
        self.payload.as_ref()
    }

    pub fn set_payload(&mut self, payload: Option<IpPacketList>) {
        self.payload = payload;
    }

    pub fn take_payload(&mut self) -> Option<IpPacketList> {
        self.payload.take()
    }

    /// 携带的 IP 包数量
    pub fn packet_count(&self) -> usize {
        self.payload.as_ref().map_or(0, IpPacketList::len)
    }

    pub fn prepend_to(&self, enc: &mut Encoder) -> usize {
        let mut total = 0;
        if let Some(list) = &self.payload {
            total += list.prepend_to(enc);
        }
        total += enc.prepend_non_negative_integer_block(
            types::IPOC_SEQUENCE_NUMBER,
            self.sequence_number,
        );
        total += enc.prepend_non_negative_integer_block(
            types::IPOC_CONTROL_BITS,
            self.control.bits() as u64,
        );
        total + enc.prepend_header(types::CONTENT, total)
    }

    /// 编码为完整的 Content 块
    pub fn wire_encode(&self) -> Bytes {
        let mut enc = Encoder::new();
        self.prepend_to(&mut enc);
        enc.finish()
    }

    pub fn wire_decode(block: &Block) -> Result<Self, WireError> {
        block.expect_type(types::CONTENT, "IpocPacket")?;
        let mut elements = block.elements()?.into_iter().peekable();

        let control = match elements.next_if(|b| b.tlv_type() == types::IPOC_CONTROL_BITS) {
            Some(b) => ControlSignal::from_bits(b.read_non_negative_integer()?)?,
            None => return Err(WireError::MissingField("ControlBits")),
        };
        let sequence_number =
            match elements.next_if(|b| b.tlv_type() == types::IPOC_SEQUENCE_NUMBER) {
                Some(b) => b.read_non_negative_integer()?,
                None => return Err(WireError::MissingField("SequenceNumber")),
            };
        let payload = match elements.next() {
            Some(b) => Some(IpPacketList::wire_decode(&b)?),
            None => None,
        };
        if let Some(extra) = elements.next() {
            return Err(WireError::UnexpectedType {
                context: "IpocPacket",
                expected: types::IP_PACKET_LIST,
                actual: extra.tlv_type(),
            });
        }

        Ok(Self {
            control,
            sequence_number,
            payload,
        })
    }

    /// 从 Content 块的原始字节解码
    pub fn from_wire(wire: &Bytes) -> Result<Self, WireError> {
        Self::wire_decode(&Block::decode(wire)?)
    }
}
