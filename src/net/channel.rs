//! 客户端与网关之间的点对点信道
//!
//! 上行链路承载 Interest，下行链路承载 Data；到达时间由链路模型决定，
//! 到达后以事件形式交给对端。

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, trace};

use super::deliver::{DeliverData, DeliverInterest};
use super::link::Link;
use crate::ipoc::LinkConfig;
use crate::ndn::{Data, Interest};
use crate::sim::Simulator;

#[derive(Debug)]
pub struct Channel {
    pub uplink: Link,
    pub downlink: Link,
    rng: StdRng,
}

impl Channel {
    pub fn new(uplink: Link, downlink: Link, seed: u64) -> Self {
        Self {
            uplink,
            downlink,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// 两个方向使用相同参数
    pub fn symmetric(cfg: &LinkConfig, seed: u64) -> Self {
        Self::new(Link::from_config(cfg), Link::from_config(cfg), seed)
    }

    /// 客户端 -> 网关
    pub fn send_interest(&mut self, interest: Interest, sim: &mut Simulator) {
        let bytes = interest.wire_size();
        match self.uplink.transmit(sim.now(), bytes, &mut self.rng) {
            Some(at) => {
                trace!(name = %interest.name(), bytes, arrive = %at, "Interest 上链路");
                sim.schedule(at, DeliverInterest { interest });
            }
            None => debug!(name = %interest.name(), "🗑️  Interest 在链路上丢失"),
        }
    }

    /// 网关 -> 客户端
    pub fn send_data(&mut self, data: Data, sim: &mut Simulator) {
        let bytes = data.wire_size();
        match self.downlink.transmit(sim.now(), bytes, &mut self.rng) {
            Some(at) => {
                trace!(name = %data.name(), bytes, arrive = %at, "Data 上链路");
                sim.schedule(at, DeliverData { data });
            }
            None => debug!(name = %data.name(), "🗑️  Data 在链路上丢失"),
        }
    }
}
