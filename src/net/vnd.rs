//! 虚拟网卡
//!
//! 隧道端点把解封装出的 IP 包交给它；仿真中只记录收到的包。

use bytes::Bytes;
use tracing::trace;

use super::id::Side;
use super::stats::DeviceStats;

#[derive(Debug)]
pub struct VirtualNetDevice {
    side: Side,
    received: Vec<Bytes>,
    pub stats: DeviceStats,
}

impl VirtualNetDevice {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            received: Vec::new(),
            stats: DeviceStats::default(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// 向上交付一个 IP 包
    pub fn deliver(&mut self, pkt: Bytes) {
        self.stats.delivered_pkts += 1;
        self.stats.delivered_bytes += pkt.len() as u64;
        trace!(side = %self.side, len = pkt.len(), "IP 包交付到本地网卡");
        self.received.push(pkt);
    }

    /// 按交付顺序排列的所有 IP 包
    pub fn received(&self) -> &[Bytes] {
        &self.received
    }
}
