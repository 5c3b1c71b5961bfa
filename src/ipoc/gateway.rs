//! 网关（生产方）封装逻辑
//!
//! 网关收到客户端的 Interest 后有两件独立的事要做：
//! - 把 Interest 携带的 IP 包经过重排序器交给本地虚拟网卡；
//! - 根据 CIT 条目状态决定立即应答、驱逐最旧的记录，或者挂起等待。
//!
//! 本地网卡送来的 IP 包会立即消费一个挂起的 Interest；没有挂起的 Interest 时
//! 先缓存，等下一个 Interest 到达后按大小预算打包发出。

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use bytes::Bytes;

use super::cit::{Cit, CitEntry, InterestRecord};
use super::config::{ConfigError, GatewayConfig};
use super::resequencer::{Resequencer, SimGapTimers};
use crate::ndn::{Data, Interest, Name, NameError};
use crate::net::{Face, with_gateway};
use crate::sim::{Event, SimTime, Simulator, World};
use crate::wire::{ControlSignal, IpPacketList, IpocPacket};

/// 网关的不可变参数（名字已解析）
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub prefix: Name,
    pub client_addr: Name,
    pub client_addr_components: usize,
    pub min_pending: usize,
    pub max_pending: usize,
    pub wait_for_gap: SimTime,
    pub timeout_margin: SimTime,
    pub response_size_budget: usize,
    pub freshness: SimTime,
    pub signature: u64,
}

impl GatewaySettings {
    pub fn from_config(cfg: &GatewayConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            prefix: cfg.prefix.parse()?,
            client_addr: cfg.client_addr.parse()?,
            client_addr_components: cfg.client_addr_components,
            min_pending: cfg.min_pending,
            max_pending: cfg.max_pending,
            wait_for_gap: cfg.wait_for_gap(),
            timeout_margin: cfg.timeout_margin(),
            response_size_budget: cfg.response_size_budget,
            freshness: cfg.freshness(),
            signature: cfg.signature,
        })
    }

    /// 构造一个携带封装包的 Data
    fn make_data(&self, name: Name, pkt: &IpocPacket) -> Data {
        let mut data = Data::new(name)
            .with_freshness(self.freshness)
            .with_signature_value(self.signature);
        data.set_content(pkt.wire_encode());
        data
    }

    /// 非立即应答使用的响应名：`<prefix>/<client_addr>/<seg>`
    fn response_name(&self, client_addr: &Name, seg: u64) -> Name {
        self.prefix.clone().append_name(client_addr).append_segment(seg)
    }
}

/// 已解析的 Interest：重排序器按 `seq` 排序
#[derive(Debug, Clone)]
pub struct ParsedInterest {
    pub client_addr: Name,
    pub seq: u64,
    pub interest: Interest,
}

impl ParsedInterest {
    /// 从名字中取出客户端地址与段号。
    pub fn parse(interest: Interest, addr_components: usize) -> Result<Self, NameError> {
        let name = interest.name();
        let needed = addr_components + 2;
        if name.len() < needed {
            return Err(NameError::TooShort {
                name: name.to_string(),
                needed,
                actual: name.len(),
            });
        }
        let client_addr = name.sub_name(1, addr_components);
        let seq = name.last_segment()?;
        Ok(Self {
            client_addr,
            seq,
            interest,
        })
    }

    fn seq_of(p: &ParsedInterest) -> u64 {
        p.seq
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct GatewayStats {
    pub interests_received: u64,
    pub interests_malformed: u64,
    pub data_immediate: u64,
    pub data_eviction: u64,
    pub data_local_ip: u64,
    pub data_timeout: u64,
    pub ip_from_local: u64,
    pub ip_buffered: u64,
    pub ip_sent: u64,
    pub ip_delivered: u64,
}

impl GatewayStats {
    pub fn data_sent(&self) -> u64 {
        self.data_immediate + self.data_eviction + self.data_local_ip + self.data_timeout
    }
}

/// 网关应用
#[derive(Debug)]
pub struct GatewayApp {
    settings: GatewaySettings,
    cit: Cit,
    reseq: Resequencer<ParsedInterest>,
    stats: GatewayStats,
}

impl GatewayApp {
    pub fn new(settings: GatewaySettings) -> Self {
        let cit = Cit::new(settings.min_pending, settings.max_pending);
        let reseq = Resequencer::new(settings.wait_for_gap, ParsedInterest::seq_of);
        Self {
            settings,
            cit,
            reseq,
            stats: GatewayStats::default(),
        }
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    pub fn cit(&self) -> &Cit {
        &self.cit
    }

    pub fn resequencer(&self) -> &Resequencer<ParsedInterest> {
        &self.reseq
    }

    pub fn stats(&self) -> &GatewayStats {
        &self.stats
    }

    /// 收到客户端的 Interest
    #[tracing::instrument(skip(self, interest, face, sim), fields(name = %interest.name(), now = %sim.now()))]
    pub fn on_interest(&mut self, interest: Interest, face: &mut dyn Face, sim: &mut Simulator) {
        self.stats.interests_received += 1;
        let parsed = match ParsedInterest::parse(interest, self.settings.client_addr_components) {
            Ok(p) => p,
            Err(err) => {
                warn!(%err, "⚠️  无法解析 Interest 名字，丢弃");
                self.stats.interests_malformed += 1;
                return;
            }
        };
        let client_addr = parsed.client_addr.clone();
        let seq = parsed.seq;
        let name = parsed.interest.name().clone();
        let lifetime = parsed.interest.lifetime();

        let batch = self.reseq.submit(
            parsed,
            &mut SimGapTimers::new(sim, |seq| GatewayGapTimeout { seq }),
        );
        self.deliver_upward(batch, face);

        self.answer_interest(&client_addr, seq, name, lifetime, face, sim);
    }

    fn answer_interest(
        &mut self,
        client_addr: &Name,
        seq: u64,
        name: Name,
        lifetime: SimTime,
        face: &mut dyn Face,
        sim: &mut Simulator,
    ) {
        let settings = &self.settings;
        let entry = self.cit.find_or_insert(client_addr);

        if entry.pending() == 0 && !entry.is_ip_buffer_empty() {
            let seq_no = entry.next_sequence_number();
            let (data, packed) =
                pack_buffered(settings, entry, name, ControlSignal::Increase, seq_no);
            self.stats.data_immediate += 1;
            self.stats.ip_sent += packed as u64;
            info!(seq, seq_no, packed, "📤 立即应答，携带缓冲 IP 包");
            face.send_data(data, sim);
            return;
        }

        if entry.pending() >= entry.max() {
            let evicted = entry.pop_record();
            if let Some(id) = evicted.timeout() {
                sim.cancel(id);
            }
            let seq_no = entry.next_sequence_number();
            let pkt = IpocPacket::new(ControlSignal::Decrease, seq_no);
            let data = settings.make_data(settings.response_name(client_addr, evicted.seq()), &pkt);
            self.stats.data_eviction += 1;
            debug!(evicted = evicted.seq(), seq_no, "挂起过多，驱逐最旧记录");
            face.send_data(data, sim);
        }

        let after = lifetime.saturating_sub(settings.timeout_margin);
        let id = sim.schedule_in(
            after,
            CitEntryTimeout {
                client_addr: client_addr.clone(),
            },
        );
        entry.push_record(InterestRecord::new(seq).with_timeout(id));
        trace!(seq, pending = entry.pending(), "挂起 Interest");
    }

    /// 本地网卡送来一个要发往客户端的 IP 包
    #[tracing::instrument(skip(self, pkt, face, sim), fields(len = pkt.len(), now = %sim.now()))]
    pub fn on_local_ip(&mut self, pkt: Bytes, face: &mut dyn Face, sim: &mut Simulator) {
        self.stats.ip_from_local += 1;
        let settings = &self.settings;
        let entry = self.cit.find_or_insert(&settings.client_addr);

        if entry.pending() == 0 {
            entry.push_ip_packet(pkt);
            self.stats.ip_buffered += 1;
            trace!(buffered = entry.ip_buffer_len(), "没有挂起的 Interest，缓存 IP 包");
            return;
        }

        // 控制信号按弹出前的挂起数计算
        let pending = entry.pending();
        let record = entry.pop_record();
        if let Some(id) = record.timeout() {
            sim.cancel(id);
        }
        let control = if pending < entry.min() {
            ControlSignal::Increase
        } else {
            ControlSignal::NoChange
        };
        let seq_no = entry.next_sequence_number();
        let ipoc = IpocPacket::new(control, seq_no).with_payload(IpPacketList::single(pkt));
        let data = settings.make_data(
            settings.response_name(entry.client_addr(), record.seq()),
            &ipoc,
        );
        self.stats.data_local_ip += 1;
        self.stats.ip_sent += 1;
        debug!(record = record.seq(), seq_no, ?control, "用挂起的 Interest 发送 IP 包");
        face.send_data(data, sim);
    }

    /// 最旧的挂起记录即将过期
    #[tracing::instrument(skip(self, client_addr, face, sim), fields(client_addr = %client_addr, now = %sim.now()))]
    pub fn on_cit_timeout(&mut self, client_addr: &Name, face: &mut dyn Face, sim: &mut Simulator) {
        let settings = &self.settings;
        let entry = self.cit.find_or_insert(client_addr);
        if entry.pending() == 0 {
            trace!("没有挂起记录，忽略超时");
            return;
        }

        // 正在触发的定时器已不在队列中，取消它是空操作
        let pending = entry.pending();
        let record = entry.pop_record();
        if let Some(id) = record.timeout() {
            sim.cancel(id);
        }
        let control = match pending.cmp(&entry.min()) {
            std::cmp::Ordering::Less => ControlSignal::Increase,
            std::cmp::Ordering::Greater => ControlSignal::Decrease,
            std::cmp::Ordering::Equal => ControlSignal::NoChange,
        };
        let seq_no = entry.next_sequence_number();
        let pkt = IpocPacket::new(control, seq_no);
        let data = settings.make_data(settings.response_name(client_addr, record.seq()), &pkt);
        self.stats.data_timeout += 1;
        debug!(record = record.seq(), seq_no, ?control, "挂起记录超时，发送空响应");
        face.send_data(data, sim);
    }

    /// 上行方向的 gap 定时器到期
    pub fn on_gap_timeout(&mut self, seq: u64, face: &mut dyn Face, sim: &mut Simulator) {
        let batch = self.reseq.on_gap_timeout(
            seq,
            &mut SimGapTimers::new(sim, |seq| GatewayGapTimeout { seq }),
        );
        self.deliver_upward(batch, face);
    }

    fn deliver_upward(&mut self, batch: Vec<ParsedInterest>, face: &mut dyn Face) {
        for parsed in batch {
            if let Some(pkt) = parsed.interest.into_payload() {
                self.stats.ip_delivered += 1;
                face.deliver_ip(pkt);
            }
        }
    }
}

/// 按响应大小预算从缓冲区打包 IP 包。
///
/// 每加入一个包就重新编码整个 Data；越过预算的那个包留在缓冲区。
/// 队首包本身超过预算时仍单独发出，避免缓冲区永远卡住。返回响应与打包的包数。
pub(crate) fn pack_buffered(
    settings: &GatewaySettings,
    entry: &mut CitEntry,
    name: Name,
    control: ControlSignal,
    seq_no: u64,
) -> (Data, usize) {
    let budget = settings.response_size_budget;
    let mut committed: Option<Data> = None;
    let mut list: Option<IpPacketList> = None;
    let mut count = 0;

    for pkt in entry.buffered_packets() {
        match list.as_mut() {
            Some(l) => l.push(pkt.clone()),
            None => list = Some(IpPacketList::single(pkt.clone())),
        }
        let mut ipoc = IpocPacket::new(control, seq_no);
        ipoc.set_payload(list.clone());
        let data = settings.make_data(name.clone(), &ipoc);
        let size = data.wire_size();
        if size > budget && count > 0 {
            break;
        }
        count += 1;
        committed = Some(data);
        if size > budget {
            warn!(size, budget, "单个 IP 包已超过响应预算");
            break;
        }
    }

    entry.take_ip_packets(count);
    let data =
        committed.unwrap_or_else(|| settings.make_data(name, &IpocPacket::new(control, seq_no)));
    (data, count)
}

/// 事件：挂起记录超时
#[derive(Debug)]
pub struct CitEntryTimeout {
    pub client_addr: Name,
}

impl Event for CitEntryTimeout {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        with_gateway(world, |face, gw| gw.on_cit_timeout(&self.client_addr, face, sim));
    }
}

/// 事件：网关重排序器的 gap 定时器到期
#[derive(Debug)]
pub struct GatewayGapTimeout {
    pub seq: u64,
}

impl Event for GatewayGapTimeout {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        with_gateway(world, |face, gw| gw.on_gap_timeout(self.seq, face, sim));
    }
}

/// 事件：本地网卡有 IP 包要发往客户端
#[derive(Debug)]
pub struct GatewayLocalIp {
    pub pkt: Bytes,
}

impl Event for GatewayLocalIp {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let GatewayLocalIp { pkt } = *self;
        with_gateway(world, |face, gw| gw.on_local_ip(pkt, face, sim));
    }
}
