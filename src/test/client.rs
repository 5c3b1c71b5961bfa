use bytes::Bytes;

use super::RecordingFace;
use crate::ipoc::{ClientConfig, ClientSettings, IpocClient};
use crate::ndn::{Data, Name};
use crate::sim::Simulator;
use crate::wire::{ControlSignal, IpPacketList, IpocPacket};

fn client_with(cfg: ClientConfig) -> IpocClient {
    IpocClient::new(ClientSettings::from_config(&cfg).expect("settings"))
}

fn client() -> IpocClient {
    client_with(ClientConfig::default())
}

fn response(control: ControlSignal, seq: u64, pkts: &[&'static [u8]]) -> Data {
    let mut pkt = IpocPacket::new(control, seq);
    if !pkts.is_empty() {
        let list = pkts.iter().map(|p| Bytes::from_static(*p)).collect();
        pkt = pkt.with_payload(IpPacketList::new(list).expect("non-empty"));
    }
    let name: Name = "/ndnSIM/11/0/0/12".parse().expect("name");
    let mut data = Data::new(name.append_segment(seq));
    data.set_content(pkt.wire_encode());
    data
}

#[test]
fn fast_trigger_needs_positive_credit() {
    let mut c = client();
    let mut sim = Simulator::default();
    let mut face = RecordingFace::default();

    c.on_timer0(&mut face, &mut sim);
    assert!(face.interests.is_empty());
    assert_eq!(c.stats().timer0_skipped, 1);

    c.adjust_credit(2);
    c.on_timer0(&mut face, &mut sim);
    assert_eq!(face.interests.len(), 1);
    assert_eq!(c.credit(), 1);
}

#[test]
fn slow_trigger_always_sends_and_credit_is_floored() {
    let mut c = client();
    let mut sim = Simulator::default();
    let mut face = RecordingFace::default();
    for _ in 0..15 {
        c.on_timer1(&mut face, &mut sim);
    }
    assert_eq!(face.interests.len(), 15);
    assert_eq!(c.credit(), -10);
    assert_eq!(c.stats().interests_by_timer1, 15);
}

#[test]
fn request_names_carry_a_monotonic_segment() {
    let mut c = client();
    let mut sim = Simulator::default();
    let mut face = RecordingFace::default();
    c.on_timer1(&mut face, &mut sim);
    c.on_local_ip(Bytes::from_static(b"up"), &mut face, &mut sim);
    c.on_timer1(&mut face, &mut sim);

    let segs: Vec<u64> = face
        .interests
        .iter()
        .map(|i| i.name().last_segment().expect("segment"))
        .collect();
    assert_eq!(segs, vec![0, 1, 2]);
    assert_eq!(
        face.interests[0].name().to_string(),
        "/ndnSIM/11/0/0/12/%00%00"
    );
    assert!(!face.interests[0].has_payload());
    assert_eq!(face.interests[1].payload(), Some(&Bytes::from_static(b"up")));
    assert_eq!(c.next_segment(), 3);
}

#[test]
fn credit_follows_response_feedback_within_bounds() {
    let mut c = client_with(ClientConfig {
        max_credit: 2,
        ..ClientConfig::default()
    });
    let mut sim = Simulator::default();
    let mut face = RecordingFace::default();

    for seq in 0..4 {
        c.on_data(response(ControlSignal::Increase, seq, &[]), &mut face, &mut sim);
    }
    assert_eq!(c.credit(), 2);
    c.on_data(response(ControlSignal::NoChange, 4, &[]), &mut face, &mut sim);
    assert_eq!(c.credit(), 2);
    for seq in 5..10 {
        c.on_data(response(ControlSignal::Decrease, seq, &[]), &mut face, &mut sim);
    }
    assert_eq!(c.credit(), -2);
}

#[test]
fn local_ip_resets_both_triggers() {
    let mut c = client();
    let mut sim = Simulator::default();
    let mut face = RecordingFace::default();

    c.on_local_ip(Bytes::from_static(b"x"), &mut face, &mut sim);
    assert_eq!(sim.pending_events(), 0);

    c.start(&mut sim);
    assert_eq!(sim.pending_events(), 2);
    c.on_local_ip(Bytes::from_static(b"y"), &mut face, &mut sim);
    assert_eq!(sim.pending_events(), 2);
    assert_eq!(c.stats().interests_by_ip, 2);
    assert_eq!(c.credit(), -2);

    c.stop(&mut sim);
    assert_eq!(sim.pending_events(), 0);
    assert!(!c.is_running());
}

#[test]
fn responses_are_resequenced_before_delivery() {
    let mut c = client();
    let mut sim = Simulator::default();
    let mut face = RecordingFace::default();

    c.on_data(response(ControlSignal::NoChange, 0, &[b"a", b"b"]), &mut face, &mut sim);
    c.on_data(response(ControlSignal::NoChange, 2, &[b"d"]), &mut face, &mut sim);
    assert_eq!(face.delivered.len(), 2);
    assert_eq!(sim.pending_events(), 1);

    c.on_data(response(ControlSignal::NoChange, 1, &[b"c"]), &mut face, &mut sim);
    let got: Vec<&[u8]> = face.delivered.iter().map(|b| b.as_ref()).collect();
    assert_eq!(got, vec![&b"a"[..], b"b", b"c", b"d"]);
    assert_eq!(c.stats().ip_delivered, 4);
    // 空洞补齐后 gap 定时器被取消
    assert_eq!(sim.pending_events(), 0);
}

#[test]
fn gap_timeout_skips_a_lost_response() {
    let mut c = client();
    let mut sim = Simulator::default();
    let mut face = RecordingFace::default();

    c.on_data(response(ControlSignal::NoChange, 0, &[b"a"]), &mut face, &mut sim);
    c.on_data(response(ControlSignal::NoChange, 2, &[b"c"]), &mut face, &mut sim);
    c.on_gap_timeout(2, &mut face, &mut sim);
    assert_eq!(face.delivered.len(), 2);
    assert_eq!(c.resequencer().last_delivered(), 2);
}

#[test]
fn undecodable_response_is_discarded() {
    let mut c = client();
    let mut sim = Simulator::default();
    let mut face = RecordingFace::default();

    let mut data = Data::new("/ndnSIM/x".parse().expect("name"));
    data.set_content(Bytes::from_static(&[0x15, 6, 0x01, 0x01, 0x02, 0x02, 0x01, 0x00]));
    c.on_data(data, &mut face, &mut sim);

    // 空 Content 缺少必需字段
    c.on_data(Data::new("/ndnSIM/y".parse().expect("name")), &mut face, &mut sim);

    assert_eq!(c.stats().data_received, 2);
    assert_eq!(c.stats().data_malformed, 2);
    assert_eq!(c.credit(), 0);
    assert!(face.delivered.is_empty());
}

#[test]
fn initial_credit_is_clamped() {
    let c = IpocClient::new(ClientSettings {
        initial_credit: 99,
        ..ClientSettings::from_config(&ClientConfig::default()).expect("settings")
    });
    assert_eq!(c.credit(), 10);
}
