//! 客户端（请求方）封装与节奏控制（IDC）
//!
//! 两个周期触发器驱动 Interest 发送：
//! - timer0（快）：只有信用为正时才发送；
//! - timer1（慢）：总是发送，保证网关始终有可用的挂起 Interest。
//!
//! 每发送一个 Interest 信用减 1，网关在响应里携带的控制信号再把信用调回来。
//! 本地 IP 包到达时立即用一个 Interest 携带出去，并重置两个触发器。

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use super::config::{ClientConfig, ConfigError};
use super::resequencer::{Resequencer, SimGapTimers};
use crate::ndn::{Data, Interest, Name};
use crate::net::{Face, with_client};
use crate::sim::{Event, EventId, SimTime, Simulator, World};
use crate::wire::{IpocPacket, WireError};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub name: Name,
    pub timer0: SimTime,
    pub timer1: SimTime,
    pub max_credit: i64,
    pub initial_credit: i64,
    pub interest_lifetime: SimTime,
    pub wait_for_gap: SimTime,
}

impl ClientSettings {
    pub fn from_config(cfg: &ClientConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            name: cfg.name.parse()?,
            timer0: cfg.timer0(),
            timer1: cfg.timer1(),
            max_credit: i64::from(cfg.max_credit),
            initial_credit: i64::from(cfg.initial_credit),
            interest_lifetime: cfg.interest_lifetime(),
            wait_for_gap: cfg.wait_for_gap(),
        })
    }
}

/// 触发一次 Interest 发送的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendCause {
    IpPacket,
    Timer0,
    Timer1,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct ClientStats {
    pub interests_by_ip: u64,
    pub interests_by_timer0: u64,
    pub interests_by_timer1: u64,
    pub timer0_skipped: u64,
    pub data_received: u64,
    pub data_malformed: u64,
    pub ip_from_local: u64,
    pub ip_delivered: u64,
}

impl ClientStats {
    pub fn interests_sent(&self) -> u64 {
        self.interests_by_ip + self.interests_by_timer0 + self.interests_by_timer1
    }
}

fn ipoc_seq(pkt: &IpocPacket) -> u64 {
    pkt.sequence_number()
}

#[derive(Debug)]
pub struct IpocClient {
    settings: ClientSettings,
    credit: i64,
    next_segment: u64,
    timer0: Option<EventId>,
    timer1: Option<EventId>,
    reseq: Resequencer<IpocPacket>,
    stats: ClientStats,
}

impl IpocClient {
    pub fn new(settings: ClientSettings) -> Self {
        let credit = settings
            .initial_credit
            .clamp(-settings.max_credit, settings.max_credit);
        let reseq = Resequencer::new(settings.wait_for_gap, ipoc_seq);
        Self {
            settings,
            credit,
            next_segment: 0,
            timer0: None,
            timer1: None,
            reseq,
            stats: ClientStats::default(),
        }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn credit(&self) -> i64 {
        self.credit
    }

    /// 下一个 Interest 将使用的段号
    pub fn next_segment(&self) -> u64 {
        self.next_segment
    }

    pub fn is_running(&self) -> bool {
        self.timer0.is_some() || self.timer1.is_some()
    }

    pub fn resequencer(&self) -> &Resequencer<IpocPacket> {
        &self.reseq
    }

    pub fn stats(&self) -> &ClientStats {
        &self.stats
    }

    /// 启动两个周期触发器
    pub fn start(&mut self, sim: &mut Simulator) {
        info!(name = %self.settings.name, credit = self.credit, "▶️  客户端启动");
        self.arm_timer0(sim);
        self.arm_timer1(sim);
    }

    pub fn stop(&mut self, sim: &mut Simulator) {
        self.cancel_timers(sim);
        info!(sent = self.stats.interests_sent(), "⏹️  客户端停止");
    }

    fn arm_timer0(&mut self, sim: &mut Simulator) {
        self.timer0 = Some(sim.schedule_in(self.settings.timer0, Timer0Fire));
    }

    fn arm_timer1(&mut self, sim: &mut Simulator) {
        self.timer1 = Some(sim.schedule_in(self.settings.timer1, Timer1Fire));
    }

    fn cancel_timers(&mut self, sim: &mut Simulator) {
        for id in [self.timer0.take(), self.timer1.take()].into_iter().flatten() {
            sim.cancel(id);
        }
    }

    pub fn on_timer0(&mut self, face: &mut dyn Face, sim: &mut Simulator) {
        if self.credit > 0 {
            self.send_interest(None, SendCause::Timer0, face, sim);
        } else {
            self.stats.timer0_skipped += 1;
            trace!(credit = self.credit, "信用不足，timer0 跳过");
        }
        self.arm_timer0(sim);
    }

    pub fn on_timer1(&mut self, face: &mut dyn Face, sim: &mut Simulator) {
        self.send_interest(None, SendCause::Timer1, face, sim);
        self.arm_timer1(sim);
    }

    /// 本地网卡送来一个要发往网关的 IP 包
    #[tracing::instrument(skip(self, pkt, face, sim), fields(len = pkt.len(), now = %sim.now()))]
    pub fn on_local_ip(&mut self, pkt: Bytes, face: &mut dyn Face, sim: &mut Simulator) {
        self.stats.ip_from_local += 1;
        self.send_interest(Some(pkt), SendCause::IpPacket, face, sim);
        if self.is_running() {
            self.cancel_timers(sim);
            self.arm_timer0(sim);
            self.arm_timer1(sim);
        }
    }

    /// 收到网关的响应
    #[tracing::instrument(skip(self, data, face, sim), fields(name = %data.name(), now = %sim.now()))]
    pub fn on_data(&mut self, data: Data, face: &mut dyn Face, sim: &mut Simulator) {
        self.stats.data_received += 1;
        let pkt = match decode_response(&data) {
            Ok(pkt) => pkt,
            Err(err) => {
                warn!(%err, "⚠️  响应内容无法解码，丢弃");
                self.stats.data_malformed += 1;
                return;
            }
        };

        self.adjust_credit(pkt.control().credit_delta());
        debug!(
            seq = pkt.sequence_number(),
            control = ?pkt.control(),
            ip_pkts = pkt.packet_count(),
            credit = self.credit,
            "📥 收到响应"
        );

        let batch = self
            .reseq
            .submit(pkt, &mut SimGapTimers::new(sim, |seq| ClientGapTimeout { seq }));
        self.deliver_upward(batch, face);
    }

    pub fn on_gap_timeout(&mut self, seq: u64, face: &mut dyn Face, sim: &mut Simulator) {
        let batch = self
            .reseq
            .on_gap_timeout(seq, &mut SimGapTimers::new(sim, |seq| ClientGapTimeout { seq }));
        self.deliver_upward(batch, face);
    }

    fn deliver_upward(&mut self, batch: Vec<IpocPacket>, face: &mut dyn Face) {
        for mut pkt in batch {
            let Some(list) = pkt.take_payload() else {
                continue;
            };
            for ip in list {
                self.stats.ip_delivered += 1;
                face.deliver_ip(ip);
            }
        }
    }

    /// 按控制信号调整信用，结果限制在 `[-max_credit, max_credit]`
    pub fn adjust_credit(&mut self, delta: i64) {
        let max = self.settings.max_credit;
        self.credit = self.credit.saturating_add(delta).clamp(-max, max);
    }

    fn send_interest(
        &mut self,
        payload: Option<Bytes>,
        cause: SendCause,
        face: &mut dyn Face,
        sim: &mut Simulator,
    ) {
        let seg = self.next_segment;
        self.next_segment += 1;
        let name = self.settings.name.clone().append_segment(seg);
        let mut interest = Interest::new(name)
            .with_nonce(seg as u32)
            .with_lifetime(self.settings.interest_lifetime);
        if let Some(pkt) = payload {
            interest = interest.with_payload(pkt);
        }

        self.adjust_credit(-1);
        match cause {
            SendCause::IpPacket => self.stats.interests_by_ip += 1,
            SendCause::Timer0 => self.stats.interests_by_timer0 += 1,
            SendCause::Timer1 => self.stats.interests_by_timer1 += 1,
        }
        trace!(seg, ?cause, credit = self.credit, "发送 Interest");
        face.send_interest(interest, sim);
    }
}

fn decode_response(data: &Data) -> Result<IpocPacket, WireError> {
    IpocPacket::wire_decode(&data.content_block()?)
}

/// 事件：快速触发器
#[derive(Debug)]
pub struct Timer0Fire;

impl Event for Timer0Fire {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        with_client(world, |face, client| client.on_timer0(face, sim));
    }
}

/// 事件：慢速触发器
#[derive(Debug)]
pub struct Timer1Fire;

impl Event for Timer1Fire {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        with_client(world, |face, client| client.on_timer1(face, sim));
    }
}

/// 事件：客户端重排序器的 gap 定时器到期
#[derive(Debug)]
pub struct ClientGapTimeout {
    pub seq: u64,
}

impl Event for ClientGapTimeout {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        with_client(world, |face, client| client.on_gap_timeout(self.seq, face, sim));
    }
}

/// 事件：本地网卡有 IP 包要发往网关
#[derive(Debug)]
pub struct ClientLocalIp {
    pub pkt: Bytes,
}

impl Event for ClientLocalIp {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let ClientLocalIp { pkt } = *self;
        with_client(world, |face, client| client.on_local_ip(pkt, face, sim));
    }
}
