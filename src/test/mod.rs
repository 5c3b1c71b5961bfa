use bytes::Bytes;

use crate::ndn::{Data, Interest};
use crate::net::Face;
use crate::sim::Simulator;

mod client;
mod config;
mod resequencer;
mod sim_time;
mod simulator;

/// 记录所有输出、不经过信道的 Face
#[derive(Debug, Default)]
pub(crate) struct RecordingFace {
    pub interests: Vec<Interest>,
    pub data: Vec<Data>,
    pub delivered: Vec<Bytes>,
}

impl Face for RecordingFace {
    fn send_interest(&mut self, interest: Interest, _sim: &mut Simulator) {
        self.interests.push(interest);
    }

    fn send_data(&mut self, data: Data, _sim: &mut Simulator) {
        self.data.push(data);
    }

    fn deliver_ip(&mut self, pkt: Bytes) {
        self.delivered.push(pkt);
    }
}
