//! Network-facing API used by the tunnel endpoints.

use bytes::Bytes;

use crate::ndn::{Data, Interest};
use crate::sim::Simulator;

/// What an endpoint can do to the outside world: put messages on the
/// request/response network and hand raw IP packets to its local interface.
pub trait Face {
    fn send_interest(&mut self, interest: Interest, sim: &mut Simulator);
    fn send_data(&mut self, data: Data, sim: &mut Simulator);
    /// Push one IP packet up to the local virtual interface.
    fn deliver_ip(&mut self, pkt: Bytes);
}
