//! 报文交付事件
//!
//! 链路把 Interest / Data 送到对端时执行。

use super::proto_bridge::{with_client, with_gateway};
use crate::ndn::{Data, Interest};
use crate::sim::{Event, Simulator, World};
use tracing::debug;

/// 事件：Interest 到达网关
#[derive(Debug)]
pub struct DeliverInterest {
    pub interest: Interest,
}

impl Event for DeliverInterest {
    #[tracing::instrument(skip(self, sim, world), fields(name = %self.interest.name()))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let DeliverInterest { interest } = *self;
        debug!(now = %sim.now(), "📨 Interest 到达网关");
        with_gateway(world, |face, gw| gw.on_interest(interest, face, sim));
    }
}

/// 事件：Data 到达客户端
#[derive(Debug)]
pub struct DeliverData {
    pub data: Data,
}

impl Event for DeliverData {
    #[tracing::instrument(skip(self, sim, world), fields(name = %self.data.name()))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let DeliverData { data } = *self;
        debug!(now = %sim.now(), "📨 Data 到达客户端");
        with_client(world, |face, client| client.on_data(data, face, sim));
    }
}
