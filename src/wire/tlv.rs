//! TLV 编解码原语
//!
//! TLV-TYPE / TLV-LENGTH 使用 NDN 的变长数字：小于 253 时占 1 字节，
//! 否则以 0xFD / 0xFE / 0xFF 开头再跟 2 / 4 / 8 字节大端整数。
//! 编码器从尾到头 prepend，先写 value，再写 length，最后写 type。

use bytes::{Buf, Bytes};

use super::WireError;

/// 本 crate 使用的 TLV-TYPE 编号。
pub mod types {
    pub const INTEREST: u64 = 5;
    pub const DATA: u64 = 6;
    pub const NAME: u64 = 7;
    pub const GENERIC_NAME_COMPONENT: u64 = 8;
    pub const NONCE: u64 = 10;
    pub const INTEREST_LIFETIME: u64 = 12;
    pub const META_INFO: u64 = 20;
    pub const CONTENT: u64 = 21;
    pub const SIGNATURE_INFO: u64 = 22;
    pub const SIGNATURE_VALUE: u64 = 23;
    pub const FRESHNESS_PERIOD: u64 = 25;
    pub const SIGNATURE_TYPE: u64 = 27;
    pub const APPLICATION_PARAMETERS: u64 = 36;

    /// 封装包内的控制位
    pub const IPOC_CONTROL_BITS: u64 = 1;
    /// 封装包内的序列号
    pub const IPOC_SEQUENCE_NUMBER: u64 = 2;
    /// IP 包列表（应用私有区间）
    pub const IP_PACKET_LIST: u64 = 128;
    /// 单个 IP 包
    pub const IP_PACKET: u64 = 129;
}

/// 变长数字编码后的字节数
pub fn var_number_size(n: u64) -> usize {
    if n < 253 {
        1
    } else if n <= u16::MAX as u64 {
        3
    } else if n <= u32::MAX as u64 {
        5
    } else {
        9
    }
}

/// NonNegativeInteger 编码后的字节数
pub fn non_negative_integer_size(n: u64) -> usize {
    if n <= u8::MAX as u64 {
        1
    } else if n <= u16::MAX as u64 {
        2
    } else if n <= u32::MAX as u64 {
        4
    } else {
        8
    }
}

/// 反向构建的 TLV 编码器。
///
/// 所有 `prepend_*` 方法返回本次写入的字节数，便于调用方累加 TLV-LENGTH。
#[derive(Debug, Default)]
pub struct Encoder {
    rev: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rev.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rev.is_empty()
    }

    pub fn prepend_byte(&mut self, b: u8) -> usize {
        self.rev.push(b);
        1
    }

    pub fn prepend_bytes(&mut self, bytes: &[u8]) -> usize {
        self.rev.extend(bytes.iter().rev());
        bytes.len()
    }

    pub fn prepend_var_number(&mut self, n: u64) -> usize {
        if n < 253 {
            self.prepend_byte(n as u8)
        } else if n <= u16::MAX as u64 {
            self.prepend_bytes(&(n as u16).to_be_bytes());
            self.prepend_byte(0xFD);
            3
        } else if n <= u32::MAX as u64 {
            self.prepend_bytes(&(n as u32).to_be_bytes());
            self.prepend_byte(0xFE);
            5
        } else {
            self.prepend_bytes(&n.to_be_bytes());
            self.prepend_byte(0xFF);
            9
        }
    }

    pub fn prepend_non_negative_integer(&mut self, n: u64) -> usize {
        match non_negative_integer_size(n) {
            1 => self.prepend_byte(n as u8),
            2 => self.prepend_bytes(&(n as u16).to_be_bytes()),
            4 => self.prepend_bytes(&(n as u32).to_be_bytes()),
            _ => self.prepend_bytes(&n.to_be_bytes()),
        }
    }

    /// 写入 TLV 头（type + length），value 必须已经 prepend 完毕。
    pub fn prepend_header(&mut self, tlv_type: u64, value_len: usize) -> usize {
        let len = self.prepend_var_number(value_len as u64);
        len + self.prepend_var_number(tlv_type)
    }

    pub fn prepend_block_value(&mut self, tlv_type: u64, value: &[u8]) -> usize {
        let len = self.prepend_bytes(value);
        len + self.prepend_header(tlv_type, len)
    }

    pub fn prepend_non_negative_integer_block(&mut self, tlv_type: u64, n: u64) -> usize {
        let len = self.prepend_non_negative_integer(n);
        len + self.prepend_header(tlv_type, len)
    }

    /// 得到正序字节流
    pub fn finish(self) -> Bytes {
        let mut v = self.rev;
        v.reverse();
        Bytes::from(v)
    }
}

/// 从游标读取一个变长数字
pub fn read_var_number(buf: &mut &[u8]) -> Result<u64, WireError> {
    if !buf.has_remaining() {
        return Err(WireError::Truncated { needed: 1 });
    }
    let first = buf.get_u8();
    let width = match first {
        0..=252 => return Ok(first as u64),
        0xFD => 2,
        0xFE => 4,
        0xFF => 8,
    };
    if buf.remaining() < width {
        return Err(WireError::Truncated {
            needed: width - buf.remaining(),
        });
    }
    Ok(match width {
        2 => buf.get_u16() as u64,
        4 => buf.get_u32() as u64,
        _ => buf.get_u64(),
    })
}

/// 一个 TLV 块：type + value（value 为原始字节，按需再解析子元素）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    tlv_type: u64,
    value: Bytes,
}

impl Block {
    pub fn new(tlv_type: u64, value: impl Into<Bytes>) -> Self {
        Self {
            tlv_type,
            value: value.into(),
        }
    }

    pub fn from_non_negative_integer(tlv_type: u64, n: u64) -> Self {
        let mut enc = Encoder::new();
        enc.prepend_non_negative_integer(n);
        Self::new(tlv_type, enc.finish())
    }

    pub fn tlv_type(&self) -> u64 {
        self.tlv_type
    }

    pub fn value(&self) -> &Bytes {
        &self.value
    }

    pub fn into_value(self) -> Bytes {
        self.value
    }

    /// 完整编码后的字节数
    pub fn wire_size(&self) -> usize {
        var_number_size(self.tlv_type) + var_number_size(self.value.len() as u64) + self.value.len()
    }

    pub fn prepend_to(&self, enc: &mut Encoder) -> usize {
        enc.prepend_block_value(self.tlv_type, &self.value)
    }

    pub fn encode(&self) -> Bytes {
        let mut enc = Encoder::new();
        self.prepend_to(&mut enc);
        enc.finish()
    }

    /// 从 `buf` 开头解析一个 TLV 块，返回块与消耗的字节数。
    pub fn decode_prefix(buf: &Bytes) -> Result<(Block, usize), WireError> {
        let mut cur: &[u8] = buf;
        let tlv_type = read_var_number(&mut cur)?;
        let len = read_var_number(&mut cur)?;
        let len = usize::try_from(len).map_err(|_| WireError::LengthOverflow(len))?;
        if cur.remaining() < len {
            return Err(WireError::Truncated {
                needed: len - cur.remaining(),
            });
        }
        let header = buf.len() - cur.remaining();
        let value = buf.slice(header..header + len);
        Ok((Block { tlv_type, value }, header + len))
    }

    /// 解析恰好占满 `buf` 的一个 TLV 块。
    pub fn decode(buf: &Bytes) -> Result<Block, WireError> {
        let (block, used) = Self::decode_prefix(buf)?;
        if used != buf.len() {
            return Err(WireError::TrailingBytes(buf.len() - used));
        }
        Ok(block)
    }

    /// 检查 TLV-TYPE
    pub fn expect_type(&self, expected: u64, context: &'static str) -> Result<(), WireError> {
        if self.tlv_type != expected {
            return Err(WireError::UnexpectedType {
                context,
                expected,
                actual: self.tlv_type,
            });
        }
        Ok(())
    }

    /// 把 value 解析为子元素序列
    pub fn elements(&self) -> Result<Vec<Block>, WireError> {
        let mut out = Vec::new();
        let mut rest = self.value.clone();
        while !rest.is_empty() {
            let (block, used) = Self::decode_prefix(&rest)?;
            out.push(block);
            rest = rest.slice(used..);
        }
        Ok(out)
    }

    /// 把 value 解释为 NonNegativeInteger
    pub fn read_non_negative_integer(&self) -> Result<u64, WireError> {
        let mut v: &[u8] = &self.value;
        match v.len() {
            1 => Ok(v.get_u8() as u64),
            2 => Ok(v.get_u16() as u64),
            4 => Ok(v.get_u32() as u64),
            8 => Ok(v.get_u64()),
            n => Err(WireError::InvalidIntegerLength(n)),
        }
    }
}
