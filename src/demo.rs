//! 隧道场景
//!
//! 组装客户端、网关与信道，注入合成 IP 流量并汇总统计。

use std::collections::HashSet;

use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;
use tracing::info;

use crate::ipoc::{
    ClientLocalIp, ClientSettings, ClientStats, ConfigError, GatewayApp, GatewayLocalIp,
    GatewaySettings, GatewayStats, IpocClient, IpocConfig,
};
use crate::net::{Channel, DeviceStats, LinkStats, Side, TunnelWorld};
use crate::sim::{Event, SimTime, Simulator, World};

const IPV4_HEADER_BYTES: usize = 20;
const TAG_BYTES: usize = 8;
/// 合成 IP 包的最小长度：IPv4 头 + 8 字节标签
pub const MIN_IP_PACKET_BYTES: usize = IPV4_HEADER_BYTES + TAG_BYTES;
// 实验用协议号
const PROTO_EXPERIMENTAL: u8 = 253;

const CLIENT_IP: [u8; 4] = [11, 0, 0, 12];
const REMOTE_IP: [u8; 4] = [10, 0, 0, 1];

fn ipv4_checksum(header: &[u8]) -> u16 {
    let mut sum: u32 = header
        .chunks(2)
        .map(|c| u32::from(u16::from_be_bytes([c[0], *c.get(1).unwrap_or(&0)])))
        .sum();
    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    !(sum as u16)
}

/// 构造一个长度为 `len` 的 IPv4 包，载荷开头是大端的 `tag`。
///
/// `side` 为发送方：客户端发出的包源地址是客户端地址，网关发出的相反。
pub fn make_ip_packet(side: Side, tag: u64, len: usize) -> Bytes {
    let len = len.max(MIN_IP_PACKET_BYTES);
    let (src, dst) = match side {
        Side::Client => (CLIENT_IP, REMOTE_IP),
        Side::Gateway => (REMOTE_IP, CLIENT_IP),
    };

    let mut header = [0u8; IPV4_HEADER_BYTES];
    header[0] = 0x45;
    header[2..4].copy_from_slice(&(len.min(u16::MAX as usize) as u16).to_be_bytes());
    header[4..6].copy_from_slice(&(tag as u16).to_be_bytes());
    header[8] = 64;
    header[9] = PROTO_EXPERIMENTAL;
    header[12..16].copy_from_slice(&src);
    header[16..20].copy_from_slice(&dst);
    let csum = ipv4_checksum(&header);
    header[10..12].copy_from_slice(&csum.to_be_bytes());

    let mut buf = BytesMut::with_capacity(len);
    buf.put_slice(&header);
    buf.put_u64(tag);
    buf.resize(len, 0);
    buf.freeze()
}

/// 取出 `make_ip_packet` 写入的标签
pub fn packet_tag(pkt: &[u8]) -> Option<u64> {
    let raw = pkt.get(IPV4_HEADER_BYTES..MIN_IP_PACKET_BYTES)?;
    Some(u64::from_be_bytes(raw.try_into().ok()?))
}

/// 按配置组装隧道世界
pub fn build_tunnel(cfg: &IpocConfig) -> Result<TunnelWorld, ConfigError> {
    cfg.validate()?;
    let client = IpocClient::new(ClientSettings::from_config(&cfg.client)?);
    let gateway = GatewayApp::new(GatewaySettings::from_config(&cfg.gateway)?);
    let channel = Channel::symmetric(&cfg.link, cfg.seed);
    Ok(TunnelWorld::new(client, gateway, channel))
}

/// 启动客户端触发器并调度两个方向的流量注入
pub fn start_tunnel(sim: &mut Simulator, world: &mut TunnelWorld, cfg: &IpocConfig) {
    world.client.start(sim);
    let t = &cfg.traffic;
    for (side, pkts) in [
        (Side::Client, t.upstream_pkts),
        (Side::Gateway, t.downstream_pkts),
    ] {
        if pkts == 0 {
            continue;
        }
        sim.schedule(
            t.start(),
            InjectIpFlow {
                side,
                next_tag: 0,
                remaining: pkts,
                pkt_bytes: t.pkt_bytes,
                gap: t.gap(),
            },
        );
    }
}

/// 流量注入事件
///
/// 周期性地把合成 IP 包交给某一侧的隧道端点
#[derive(Debug)]
pub struct InjectIpFlow {
    pub side: Side,
    pub next_tag: u64,
    pub remaining: u64,
    pub pkt_bytes: usize,
    pub gap: SimTime,
}

impl Event for InjectIpFlow {
    fn execute(self: Box<Self>, sim: &mut Simulator, _world: &mut dyn World) {
        let mut me = *self;
        if me.remaining == 0 {
            return;
        }

        // 本地网卡把包交给隧道端点
        let pkt = make_ip_packet(me.side, me.next_tag, me.pkt_bytes);
        match me.side {
            Side::Client => sim.schedule(sim.now(), ClientLocalIp { pkt }),
            Side::Gateway => sim.schedule(sim.now(), GatewayLocalIp { pkt }),
        };

        me.next_tag += 1;
        me.remaining -= 1;
        if me.remaining > 0 {
            sim.schedule_in(me.gap, InjectIpFlow { ..me });
        }
    }
}

/// 单方向 IP 流的交付情况
#[derive(Debug, Clone, Default, Serialize)]
pub struct FlowReport {
    pub injected: u64,
    pub delivered: u64,
    pub duplicates: u64,
    /// 标签小于之前已交付的最大标签的包数
    pub reordered: u64,
}

impl FlowReport {
    pub fn from_delivered(injected: u64, pkts: &[Bytes]) -> Self {
        let mut seen = HashSet::new();
        let mut report = FlowReport {
            injected,
            ..Default::default()
        };
        let mut max_tag: Option<u64> = None;
        for tag in pkts.iter().filter_map(|p| packet_tag(p)) {
            report.delivered += 1;
            if !seen.insert(tag) {
                report.duplicates += 1;
            }
            if max_tag.is_some_and(|m| tag < m) {
                report.reordered += 1;
            }
            max_tag = max_tag.max(Some(tag));
        }
        report
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TunnelReport {
    pub now_ms: u64,
    pub credit: i64,
    pub client: ClientStats,
    pub gateway: GatewayStats,
    pub uplink: LinkStats,
    pub downlink: LinkStats,
    pub client_vnd: DeviceStats,
    pub gateway_vnd: DeviceStats,
    pub upstream: FlowReport,
    pub downstream: FlowReport,
}

impl TunnelReport {
    pub fn collect(sim: &Simulator, world: &TunnelWorld) -> Self {
        let client = world.client.stats().clone();
        let gateway = world.gateway.stats().clone();
        Self {
            now_ms: sim.now().as_millis(),
            credit: world.client.credit(),
            upstream: FlowReport::from_delivered(client.ip_from_local, world.gateway_vnd.received()),
            downstream: FlowReport::from_delivered(
                gateway.ip_from_local,
                world.client_vnd.received(),
            ),
            client,
            gateway,
            uplink: world.channel.uplink.stats.clone(),
            downlink: world.channel.downlink.stats.clone(),
            client_vnd: world.client_vnd.stats.clone(),
            gateway_vnd: world.gateway_vnd.stats.clone(),
        }
    }
}

/// 组装、运行到 `until` 并返回报告
pub fn run_tunnel(cfg: &IpocConfig, until: SimTime) -> Result<TunnelReport, ConfigError> {
    let mut sim = Simulator::default();
    let mut world = build_tunnel(cfg)?;
    start_tunnel(&mut sim, &mut world, cfg);
    sim.run_until(until, &mut world);

    let report = TunnelReport::collect(&sim, &world);
    info!(
        upstream_delivered = report.upstream.delivered,
        downstream_delivered = report.downstream.delivered,
        interests = report.client.interests_sent(),
        data = report.gateway.data_sent(),
        "✅ 隧道仿真完成"
    );
    Ok(report)
}
