//! 隧道配置
//!
//! 所有设置都是构造时传入的不可变结构，可从 JSON 文件加载。
//! 时间类参数以微秒/毫秒整数保存，并提供返回 `SimTime` 的访问方法。

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ndn::NameError;
use crate::sim::SimTime;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid name in config: {0}")]
    Name(#[from] NameError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// 客户端（请求方）参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// 请求名前缀，最后追加段号
    pub name: String,
    /// 快速定时器周期（微秒），仅在信用为正时发送
    pub timer0_us: u64,
    /// 慢速定时器周期（微秒），总是发送
    pub timer1_us: u64,
    pub max_credit: u32,
    pub initial_credit: i32,
    pub wait_for_gap_us: u64,
    pub interest_lifetime_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            name: "/ndnSIM/11/0/0/12".to_string(),
            timer0_us: 1_000,
            timer1_us: 20_000,
            max_credit: 10,
            initial_credit: 0,
            wait_for_gap_us: 2_000,
            interest_lifetime_ms: 4_000,
        }
    }
}

impl ClientConfig {
    pub fn timer0(&self) -> SimTime {
        SimTime::from_micros(self.timer0_us)
    }

    pub fn timer1(&self) -> SimTime {
        SimTime::from_micros(self.timer1_us)
    }

    pub fn wait_for_gap(&self) -> SimTime {
        SimTime::from_micros(self.wait_for_gap_us)
    }

    pub fn interest_lifetime(&self) -> SimTime {
        SimTime::from_millis(self.interest_lifetime_ms)
    }
}

/// 网关（生产方）参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub prefix: String,
    /// 本网关服务的唯一客户端地址；本地 IP 包一律归到这个条目
    pub client_addr: String,
    /// 客户端地址在请求名中占用的分量数（紧跟第一个分量之后）
    pub client_addr_components: usize,
    pub min_pending: usize,
    pub max_pending: usize,
    pub wait_for_gap_us: u64,
    /// 待决记录超时 = Interest 生存期 - 该余量
    pub timeout_margin_ms: u64,
    /// 响应编码后的字节上限
    pub response_size_budget: usize,
    pub freshness_ms: u64,
    /// 占位签名值
    pub signature: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            prefix: "/ndnSIM".to_string(),
            client_addr: "/11/0/0/12".to_string(),
            client_addr_components: 4,
            min_pending: 1,
            max_pending: 2,
            wait_for_gap_us: 2_000,
            timeout_margin_ms: 1_000,
            response_size_budget: 8_000,
            freshness_ms: 0,
            signature: 0,
        }
    }
}

impl GatewayConfig {
    pub fn wait_for_gap(&self) -> SimTime {
        SimTime::from_micros(self.wait_for_gap_us)
    }

    pub fn timeout_margin(&self) -> SimTime {
        SimTime::from_millis(self.timeout_margin_ms)
    }

    pub fn freshness(&self) -> SimTime {
        SimTime::from_millis(self.freshness_ms)
    }
}

/// 客户端与网关之间的仿真链路
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub latency_us: u64,
    pub bandwidth_mbps: u64,
    /// 每条消息独立丢弃的概率
    pub loss_rate: f64,
    /// 附加的均匀随机时延上限（微秒），用于制造乱序
    pub jitter_us: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            latency_us: 5_000,
            bandwidth_mbps: 100,
            loss_rate: 0.0,
            jitter_us: 0,
        }
    }
}

impl LinkConfig {
    pub fn latency(&self) -> SimTime {
        SimTime::from_micros(self.latency_us)
    }

    pub fn jitter(&self) -> SimTime {
        SimTime::from_micros(self.jitter_us)
    }

    pub fn bandwidth_bps(&self) -> u64 {
        self.bandwidth_mbps.saturating_mul(1_000_000)
    }
}

/// 注入的合成 IP 流量
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficConfig {
    /// 客户端侧（上行）注入的 IP 包数
    pub upstream_pkts: u64,
    /// 网关侧（下行）注入的 IP 包数
    pub downstream_pkts: u64,
    pub pkt_bytes: usize,
    /// 相邻两个包的注入间隔（微秒）
    pub gap_us: u64,
    /// 开始注入的时间（毫秒）
    pub start_ms: u64,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            upstream_pkts: 100,
            downstream_pkts: 1_000,
            pkt_bytes: 1_000,
            gap_us: 500,
            start_ms: 10,
        }
    }
}

impl TrafficConfig {
    pub fn gap(&self) -> SimTime {
        SimTime::from_micros(self.gap_us)
    }

    pub fn start(&self) -> SimTime {
        SimTime::from_millis(self.start_ms)
    }
}

/// 完整场景配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IpocConfig {
    pub client: ClientConfig,
    pub gateway: GatewayConfig,
    pub link: LinkConfig,
    pub traffic: TrafficConfig,
    pub seed: u64,
}

impl IpocConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let cfg: IpocConfig = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        let c = &self.client;
        if c.timer0_us == 0 || c.timer1_us == 0 {
            return invalid("client timers must be positive");
        }
        if c.max_credit == 0 {
            return invalid("client max_credit must be positive");
        }
        if c.initial_credit.unsigned_abs() > c.max_credit {
            return invalid("client initial_credit must lie within [-max_credit, max_credit]");
        }
        if c.interest_lifetime_ms <= self.gateway.timeout_margin_ms {
            return invalid("interest lifetime must exceed the gateway timeout margin");
        }

        let g = &self.gateway;
        if g.max_pending == 0 {
            return invalid("gateway max_pending must be positive");
        }
        if g.min_pending > g.max_pending {
            return invalid("gateway min_pending must not exceed max_pending");
        }
        if g.client_addr_components == 0 {
            return invalid("gateway client_addr_components must be positive");
        }
        if g.response_size_budget == 0 {
            return invalid("gateway response_size_budget must be positive");
        }

        let l = &self.link;
        if !(0.0..1.0).contains(&l.loss_rate) {
            return invalid("link loss_rate must lie in [0, 1)");
        }
        if l.bandwidth_mbps == 0 {
            return invalid("link bandwidth must be positive");
        }

        if self.traffic.pkt_bytes < crate::demo::MIN_IP_PACKET_BYTES {
            return invalid("traffic pkt_bytes too small for a synthetic IPv4 packet");
        }
        Ok(())
    }
}
