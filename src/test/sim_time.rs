use crate::sim::SimTime;

#[test]
fn sim_time_unit_conversions() {
    assert_eq!(SimTime::from_micros(1), SimTime(1_000));
    assert_eq!(SimTime::from_millis(1), SimTime(1_000_000));
    assert_eq!(SimTime::from_secs(1), SimTime(1_000_000_000));
}

#[test]
fn sim_time_unit_conversions_saturate_on_overflow() {
    assert_eq!(SimTime::from_micros(u64::MAX), SimTime(u64::MAX));
    assert_eq!(SimTime::from_millis(u64::MAX), SimTime(u64::MAX));
    assert_eq!(SimTime::from_secs(u64::MAX), SimTime(u64::MAX));
}

#[test]
fn sim_time_saturating_arithmetic_and_accessors() {
    let t = SimTime::from_millis(3);
    assert_eq!(t.as_micros(), 3_000);
    assert_eq!(t.as_millis(), 3);
    assert_eq!(t.saturating_sub(SimTime::from_millis(5)), SimTime::ZERO);
    assert_eq!(SimTime(u64::MAX).saturating_add(t), SimTime(u64::MAX));
    assert_eq!(t.to_string(), "3.000000ms");
}
