//! Data（响应）报文

use bytes::Bytes;

use super::name::Name;
use crate::sim::SimTime;
use crate::wire::tlv::{types, Block, Encoder};
use crate::wire::WireError;

/// 占位签名类型（应用自定义）
pub const PLACEHOLDER_SIGNATURE_TYPE: u64 = 255;

// 空的 Content 块：TLV-TYPE 21，长度 0
const EMPTY_CONTENT: &[u8] = &[types::CONTENT as u8, 0];

/// Data：满足恰好一个 Interest，携带内容与占位签名。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Data {
    name: Name,
    freshness: SimTime,
    content: Bytes,
    signature_value: u64,
}

impl Data {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            freshness: SimTime::ZERO,
            content: Bytes::from_static(EMPTY_CONTENT),
            signature_value: 0,
        }
    }

    pub fn with_freshness(mut self, freshness: SimTime) -> Self {
        self.freshness = freshness;
        self
    }

    pub fn with_signature_value(mut self, value: u64) -> Self {
        self.signature_value = value;
        self
    }

    /// 设置完整编码的 Content 块（含 TLV 头）
    pub fn set_content(&mut self, content_wire: Bytes) {
        self.content = content_wire;
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn freshness(&self) -> SimTime {
        self.freshness
    }

    pub fn signature_value(&self) -> u64 {
        self.signature_value
    }

    /// Content 块的原始编码
    pub fn content_wire(&self) -> &Bytes {
        &self.content
    }

    pub fn content_block(&self) -> Result<Block, WireError> {
        Block::decode(&self.content)
    }

    pub fn prepend_to(&self, enc: &mut Encoder) -> usize {
        let mut total = enc.prepend_non_negative_integer_block(
            types::SIGNATURE_VALUE,
            self.signature_value,
        );

        let sig_type = enc.prepend_non_negative_integer_block(
            types::SIGNATURE_TYPE,
            PLACEHOLDER_SIGNATURE_TYPE,
        );
        total += sig_type + enc.prepend_header(types::SIGNATURE_INFO, sig_type);

        total += enc.prepend_bytes(&self.content);

        let fresh = enc.prepend_non_negative_integer_block(
            types::FRESHNESS_PERIOD,
            self.freshness.as_millis(),
        );
        total += fresh + enc.prepend_header(types::META_INFO, fresh);

        total += self.name.prepend_to(enc);
        total + enc.prepend_header(types::DATA, total)
    }

    pub fn wire_encode(&self) -> Bytes {
        let mut enc = Encoder::new();
        self.prepend_to(&mut enc);
        enc.finish()
    }

    pub fn wire_size(&self) -> usize {
        self.wire_encode().len()
    }
}
