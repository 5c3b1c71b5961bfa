//! Interest（请求）报文

use bytes::Bytes;

use super::name::Name;
use crate::sim::SimTime;
use crate::wire::tlv::{types, Encoder};

/// 默认 Interest 生存期（4 秒）
pub const DEFAULT_INTEREST_LIFETIME: SimTime = SimTime(4_000_000_000);

/// Interest：按名字请求内容，可选地携带一个 IP 包作为应用参数。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interest {
    name: Name,
    nonce: u32,
    lifetime: SimTime,
    payload: Option<Bytes>,
}

impl Interest {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            nonce: 0,
            lifetime: DEFAULT_INTEREST_LIFETIME,
            payload: None,
        }
    }

    pub fn with_nonce(mut self, nonce: u32) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn with_lifetime(mut self, lifetime: SimTime) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// 附带一个完整的 IP 包
    pub fn with_payload(mut self, ip_pkt: Bytes) -> Self {
        self.payload = Some(ip_pkt);
        self
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn nonce(&self) -> u32 {
        self.nonce
    }

    pub fn lifetime(&self) -> SimTime {
        self.lifetime
    }

    pub fn payload(&self) -> Option<&Bytes> {
        self.payload.as_ref()
    }

    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    pub fn into_payload(self) -> Option<Bytes> {
        self.payload
    }

    pub fn prepend_to(&self, enc: &mut Encoder) -> usize {
        let mut total = 0;
        if let Some(pkt) = &self.payload {
            let inner = enc.prepend_block_value(types::IP_PACKET, pkt);
            total += inner + enc.prepend_header(types::APPLICATION_PARAMETERS, inner);
        }
        total += enc.prepend_non_negative_integer_block(
            types::INTEREST_LIFETIME,
            self.lifetime.as_millis(),
        );
        total += enc.prepend_block_value(types::NONCE, &self.nonce.to_be_bytes());
        total += self.name.prepend_to(enc);
        total + enc.prepend_header(types::INTEREST, total)
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
