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
fn sim_time_from_secs_f64_rounds_to_nanos() {
    assert_eq!(SimTime::from_secs_f64(0.5), SimTime(500_000_000));
    assert_eq!(SimTime::from_secs_f64(1.0), SimTime::from_secs(1));
    assert_eq!(SimTime::from_secs_f64(1e-9), SimTime(1));
}

#[test]
fn sim_time_from_secs_f64_clamps_degenerate_input() {
    assert_eq!(SimTime::from_secs_f64(-1.0), SimTime::ZERO);
    assert_eq!(SimTime::from_secs_f64(f64::NAN), SimTime::ZERO);
    assert_eq!(SimTime::from_secs_f64(f64::INFINITY), SimTime::MAX);
    assert_eq!(SimTime::from_secs_f64(1e30), SimTime::MAX);
}

#[test]
fn sim_time_as_secs_f64_roundtrip() {
    assert_eq!(SimTime::from_secs(3).as_secs_f64(), 3.0);
    assert_eq!(SimTime(250_000_000).as_secs_f64(), 0.25);
}

#[test]
fn sim_time_saturating_arithmetic() {
    let a = SimTime::from_secs(2);
    let b = SimTime::from_secs(3);
    assert_eq!(a.saturating_add(b), SimTime::from_secs(5));
    assert_eq!(a.saturating_sub(b), SimTime::ZERO);
    assert_eq!(b.saturating_sub(a), SimTime::from_secs(1));
    assert_eq!(SimTime::MAX.saturating_add(SimTime(1)), SimTime::MAX);
}
