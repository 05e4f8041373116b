//! Integration tests: echo edges → ranging core → consumer read.
//!
//! Drives the real `EdgeCapture` / timeout / `MeasurementCell` stack with
//! the simulated bench and checks the observable state after each step.

use rangefinder::app::events::Reading;
use rangefinder::ranging::{EchoLevel, MeasurementState, Outcome, PulseWidth};

use crate::mock_hw::SimBench;

// ── End-to-end scenarios ──────────────────────────────────────

#[test]
fn echo_of_1160us_reads_20cm() {
    let bench = SimBench::new();
    bench.edge(EchoLevel::High);
    bench.advance_to(1_160);
    bench.edge(EchoLevel::Low);

    assert_eq!(
        bench.cell.state(),
        MeasurementState::Completed(PulseWidth::from_micros(1_160))
    );
    let Some(Outcome::Completed(width)) = bench.cell.try_take() else {
        panic!("expected a completed measurement");
    };
    assert_eq!(Reading::from_width(width, 58).distance_cm, 20);
    assert_eq!(bench.cancels.get(), 1);
    assert_eq!(bench.pending_alarm(), None);
}

#[test]
fn missing_fall_fails_at_timeout() {
    let bench = SimBench::new();
    bench.edge(EchoLevel::High);

    bench.advance_to(29_999);
    assert_eq!(bench.cell.state(), MeasurementState::Armed);

    bench.advance_to(30_000);
    assert_eq!(bench.cell.state(), MeasurementState::Failed);
    assert_eq!(bench.fires.get(), 1);

    // Stays failed until consumed.
    bench.advance_to(90_000);
    assert_eq!(bench.cell.state(), MeasurementState::Failed);
    assert_eq!(bench.cell.try_take(), Some(Outcome::Failed));
    assert!(bench.cell.can_trigger());
}

#[test]
fn zero_width_pulse_is_a_valid_reading() {
    let bench = SimBench::new();
    bench.edge(EchoLevel::High);
    bench.edge(EchoLevel::Low);
    assert_eq!(
        bench.cell.try_take(),
        Some(Outcome::Completed(PulseWidth::ZERO))
    );
}

// ── Absorbed transitions ──────────────────────────────────────

#[test]
fn fall_without_rise_is_absorbed() {
    let bench = SimBench::new();
    bench.advance_to(500);
    bench.edge(EchoLevel::Low);
    assert_eq!(bench.cell.state(), MeasurementState::Idle);
    assert_eq!(bench.cancels.get(), 0);
}

#[test]
fn rise_while_armed_keeps_first_timestamp_and_guard() {
    let bench = SimBench::new();
    bench.advance_to(1_000);
    bench.edge(EchoLevel::High);
    let first_guard = bench.pending_alarm();

    bench.advance_to(1_500);
    bench.edge(EchoLevel::High);
    assert_eq!(bench.arms.get(), 1);
    assert_eq!(bench.pending_alarm(), first_guard);
    assert_eq!(bench.cell.rise_timestamp(), Some(1_000));

    bench.advance_to(2_000);
    bench.edge(EchoLevel::Low);
    assert_eq!(
        bench.cell.try_take(),
        Some(Outcome::Completed(PulseWidth::from_micros(1_000)))
    );
}

#[test]
fn late_fall_after_timeout_is_absorbed() {
    let bench = SimBench::new();
    bench.edge(EchoLevel::High);
    bench.schedule_edge(45_000, EchoLevel::Low);
    bench.advance_to(50_000);

    assert_eq!(bench.cell.state(), MeasurementState::Failed);
    assert_eq!(bench.cancels.get(), 0);
}

#[test]
fn rise_before_consumption_does_not_start_new_episode() {
    let bench = SimBench::new();
    bench.edge(EchoLevel::High);
    bench.advance(300);
    bench.edge(EchoLevel::Low);

    bench.advance(100);
    bench.edge(EchoLevel::High);
    assert_eq!(bench.arms.get(), 1);
    assert_eq!(
        bench.cell.state(),
        MeasurementState::Completed(PulseWidth::from_micros(300))
    );
}

// ── Lifecycle ─────────────────────────────────────────────────

#[test]
fn cell_cycles_back_to_idle_after_each_outcome() {
    let bench = SimBench::new();

    for round in 0..4u64 {
        assert!(bench.cell.can_trigger(), "round {round} should start idle");
        bench.edge(EchoLevel::High);
        if round % 2 == 0 {
            bench.advance(580 * (round + 1));
            bench.edge(EchoLevel::Low);
            assert_eq!(
                bench.cell.try_take(),
                Some(Outcome::Completed(PulseWidth::from_micros(580 * (round as u32 + 1))))
            );
        } else {
            bench.advance(30_000);
            assert_eq!(bench.cell.try_take(), Some(Outcome::Failed));
        }
        assert_eq!(bench.cell.state(), MeasurementState::Idle);
        bench.advance(1_000);
    }

    assert_eq!(bench.arms.get(), 4);
    assert_eq!(bench.cancels.get(), 2);
    assert_eq!(bench.fires.get(), 2);
}
