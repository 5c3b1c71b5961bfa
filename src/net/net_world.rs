//! 隧道世界实现
//!
//! 持有两个隧道端点、它们之间的信道以及两侧的虚拟网卡。

use super::channel::Channel;
use super::id::Side;
use super::vnd::VirtualNetDevice;
use crate::ipoc::{GatewayApp, IpocClient};
use crate::sim::World;
use std::any::Any;

#[derive(Debug)]
pub struct TunnelWorld {
    pub client: IpocClient,
    pub gateway: GatewayApp,
    pub channel: Channel,
    pub client_vnd: VirtualNetDevice,
    pub gateway_vnd: VirtualNetDevice,
}

impl TunnelWorld {
    pub fn new(client: IpocClient, gateway: GatewayApp, channel: Channel) -> Self {
        Self {
            client,
            gateway,
            channel,
            client_vnd: VirtualNetDevice::new(Side::Client),
            gateway_vnd: VirtualNetDevice::new(Side::Gateway),
        }
    }

    pub fn vnd(&self, side: Side) -> &VirtualNetDevice {
        match side {
            Side::Client => &self.client_vnd,
            Side::Gateway => &self.gateway_vnd,
        }
    }
}

impl World for TunnelWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
