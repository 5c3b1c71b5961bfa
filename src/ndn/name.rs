//! 名字与名字分量
//!
//! 分量以原始字节保存；段号分量为标记字节 `0x00` 后跟 NonNegativeInteger，
//! URI 形式按 `%XX` 转义显示（例如 `/ndnSIM/11/0/0/12/%00%05`）。

use std::fmt;
use std::str::FromStr;

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::wire::tlv::{types, Block, Encoder};

const SEGMENT_MARKER: u8 = 0x00;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("invalid percent-escape in name component {0:?}")]
    InvalidEscape(String),
    #[error("name component is not a segment number")]
    NotSegment,
    #[error("name {name} has {actual} component(s), need at least {needed}")]
    TooShort {
        name: String,
        needed: usize,
        actual: usize,
    },
}

/// 名字分量
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Component(Bytes);

impl Component {
    pub fn new(value: impl Into<Bytes>) -> Self {
        Self(value.into())
    }

    pub fn from_segment(seg: u64) -> Self {
        let mut enc = Encoder::new();
        enc.prepend_non_negative_integer(seg);
        let num = enc.finish();
        let mut buf = BytesMut::with_capacity(num.len() + 1);
        buf.put_u8(SEGMENT_MARKER);
        buf.put_slice(&num);
        Self(buf.freeze())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_segment(&self) -> bool {
        self.to_segment().is_ok()
    }

    pub fn to_segment(&self) -> Result<u64, NameError> {
        let Some((&SEGMENT_MARKER, _)) = self.0.split_first() else {
            return Err(NameError::NotSegment);
        };
        Block::new(types::GENERIC_NAME_COMPONENT, self.0.slice(1..))
            .read_non_negative_integer()
            .map_err(|_| NameError::NotSegment)
    }

    fn parse_uri(s: &str) -> Result<Self, NameError> {
        let raw = s.as_bytes();
        let mut out = BytesMut::with_capacity(raw.len());
        let mut i = 0;
        while i < raw.len() {
            if raw[i] == b'%' {
                let hex = raw
                    .get(i + 1..i + 3)
                    .and_then(|h| std::str::from_utf8(h).ok())
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                    .ok_or_else(|| NameError::InvalidEscape(s.to_string()))?;
                out.put_u8(hex);
                i += 3;
            } else {
                out.put_u8(raw[i]);
                i += 1;
            }
        }
        Ok(Self(out.freeze()))
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in self.0.iter() {
            if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "%{:02X}", b)?;
            }
        }
        Ok(())
    }
}

/// 分层名字
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Name {
    comps: Vec<Component>,
}

impl Name {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.comps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comps.is_empty()
    }

    pub fn components(&self) -> &[Component] {
        &self.comps
    }

    pub fn append(mut self, comp: Component) -> Self {
        self.comps.push(comp);
        self
    }

    pub fn append_segment(self, seg: u64) -> Self {
        self.append(Component::from_segment(seg))
    }

    pub fn append_name(mut self, other: &Name) -> Self {
        self.comps.extend(other.comps.iter().cloned());
        self
    }

    /// 按下标取分量；负数从末尾计（-1 为最后一个）。
    pub fn get(&self, i: isize) -> Option<&Component> {
        let idx = if i < 0 {
            self.comps.len().checked_sub(i.unsigned_abs())?
        } else {
            i as usize
        };
        self.comps.get(idx)
    }

    /// 取 `[start, start + len)` 范围的子名字，越界部分截断。
    pub fn sub_name(&self, start: usize, len: usize) -> Name {
        let comps = self.comps.iter().skip(start).take(len).cloned().collect();
        Name { comps }
    }

    pub fn is_prefix_of(&self, other: &Name) -> bool {
        self.comps.len() <= other.comps.len()
            && self.comps.iter().zip(other.comps.iter()).all(|(a, b)| a == b)
    }

    /// 最后一个分量的段号
    pub fn last_segment(&self) -> Result<u64, NameError> {
        self.get(-1).ok_or(NameError::NotSegment)?.to_segment()
    }

    pub fn prepend_to(&self, enc: &mut Encoder) -> usize {
        let mut total = 0;
        for comp in self.comps.iter().rev() {
            total += enc.prepend_block_value(types::GENERIC_NAME_COMPONENT, comp.as_bytes());
        }
        total + enc.prepend_header(types::NAME, total)
    }
}

impl FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("ndn:").unwrap_or(s);
        let comps = s
            .split('/')
            .filter(|c| !c.is_empty())
            .map(Component::parse_uri)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Name { comps })
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.comps.is_empty() {
            return write!(f, "/");
        }
        for comp in &self.comps {
            write!(f, "/{}", comp)?;
        }
        Ok(())
    }
}
