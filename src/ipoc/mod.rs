//! IP-over-content 隧道核心
//!
//! 客户端把本地 IP 包封装进 Interest，网关把 IP 包打包进 Data 并附带信用
//! 控制信号；两端各用一个重排序器恢复顺序。

mod cit;
mod client;
mod config;
mod gateway;
mod resequencer;

pub use cit::{Cit, CitEntry, InterestRecord};
pub use client::{
    ClientGapTimeout, ClientLocalIp, ClientSettings, ClientStats, IpocClient, SendCause,
    Timer0Fire, Timer1Fire,
};
pub use config::{
    ClientConfig, ConfigError, GatewayConfig, IpocConfig, LinkConfig, TrafficConfig,
};
pub use gateway::{
    CitEntryTimeout, GatewayApp, GatewayGapTimeout, GatewayLocalIp, GatewaySettings,
    GatewayStats, ParsedInterest,
};
pub use resequencer::{ArmedGapTimers, GapTimers, Resequencer, ResequencerStats, SimGapTimers};
