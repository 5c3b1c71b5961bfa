//! 链路类型
//!
//! 单向链路：串行化时延 + 传播时延，并可按概率丢弃消息或附加随机抖动。

use rand::Rng;

use super::stats::LinkStats;
use crate::ipoc::LinkConfig;
use crate::sim::SimTime;

/// 单向仿真链路
#[derive(Debug)]
pub struct Link {
    pub latency: SimTime,
    pub bandwidth_bps: u64,
    pub busy_until: SimTime,
    pub loss_rate: f64,
    /// 附加时延在 `[0, jitter]` 内均匀分布；非零时消息可能乱序到达
    pub jitter: SimTime,
    pub stats: LinkStats,
}

impl Link {
    /// 创建新链路
    pub fn new(latency: SimTime, bandwidth_bps: u64) -> Self {
        Self {
            latency,
            bandwidth_bps,
            busy_until: SimTime::ZERO,
            loss_rate: 0.0,
            jitter: SimTime::ZERO,
            stats: LinkStats::default(),
        }
    }

    pub fn from_config(cfg: &LinkConfig) -> Self {
        Self {
            loss_rate: cfg.loss_rate,
            jitter: cfg.jitter(),
            ..Self::new(cfg.latency(), cfg.bandwidth_bps())
        }
    }

    /// 计算传输指定字节数所需的时间
    pub(crate) fn tx_time(&self, bytes: usize) -> SimTime {
        // ceil(bytes*8 / bps) 秒 -> 纳秒
        if self.bandwidth_bps == 0 {
            return SimTime(u64::MAX / 4);
        }
        let bits = (bytes as u128).saturating_mul(8);
        let nanos = (bits.saturating_mul(1_000_000_000u128)
            + (self.bandwidth_bps as u128 - 1))
            / self.bandwidth_bps as u128;
        SimTime(nanos.min(u64::MAX as u128) as u64)
    }

    /// 在 `now` 发送 `bytes` 字节：返回到达对端的时间，被丢弃时返回 `None`。
    ///
    /// 丢弃的消息同样占用链路。
    pub fn transmit<R: Rng + ?Sized>(
        &mut self,
        now: SimTime,
        bytes: usize,
        rng: &mut R,
    ) -> Option<SimTime> {
        let start = self.busy_until.max(now);
        self.busy_until = start.saturating_add(self.tx_time(bytes));
        self.stats.sent_msgs += 1;
        self.stats.sent_bytes += bytes as u64;

        if self.loss_rate > 0.0 && rng.gen_bool(self.loss_rate) {
            self.stats.dropped_msgs += 1;
            return None;
        }

        let jitter = if self.jitter > SimTime::ZERO {
            SimTime(rng.gen_range(0..=self.jitter.0))
        } else {
            SimTime::ZERO
        };
        Some(self.busy_until.saturating_add(self.latency).saturating_add(jitter))
    }
}
