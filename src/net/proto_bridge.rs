//! Helpers for accessing the tunnel endpoints from the simulation world.

use bytes::Bytes;

use crate::ipoc::{GatewayApp, IpocClient};
use crate::ndn::{Data, Interest};
use crate::sim::{Simulator, World};

use super::{Channel, Face, TunnelWorld, VirtualNetDevice};

/// An endpoint's view of the world: the shared channel plus its own
/// local interface.
pub struct LinkFace<'a> {
    pub channel: &'a mut Channel,
    pub vnd: &'a mut VirtualNetDevice,
}

impl Face for LinkFace<'_> {
    fn send_interest(&mut self, interest: Interest, sim: &mut Simulator) {
        self.channel.send_interest(interest, sim);
    }

    fn send_data(&mut self, data: Data, sim: &mut Simulator) {
        self.channel.send_data(data, sim);
    }

    fn deliver_ip(&mut self, pkt: Bytes) {
        self.vnd.deliver(pkt);
    }
}

fn tunnel_world(world: &mut dyn World) -> &mut TunnelWorld {
    world
        .as_any_mut()
        .downcast_mut::<TunnelWorld>()
        .expect("world must be TunnelWorld")
}

pub(crate) fn with_client<F, R>(world: &mut dyn World, f: F) -> R
where
    F: FnOnce(&mut dyn Face, &mut IpocClient) -> R,
{
    let TunnelWorld {
        client,
        channel,
        client_vnd,
        ..
    } = tunnel_world(world);
    let mut face = LinkFace {
        channel,
        vnd: client_vnd,
    };
    f(&mut face, client)
}

pub(crate) fn with_gateway<F, R>(world: &mut dyn World, f: F) -> R
where
    F: FnOnce(&mut dyn Face, &mut GatewayApp) -> R,
{
    let TunnelWorld {
        gateway,
        channel,
        gateway_vnd,
        ..
    } = tunnel_world(world);
    let mut face = LinkFace {
        channel,
        vnd: gateway_vnd,
    };
    f(&mut face, gateway)
}
