use crate::arbiter::{Arbitration, DEFAULT_DRIFT_WINDOW, PositionArbiter};
use common::position::{GnssFix, PositionSource};
use common::test_helper::manual_time_source::ManualTimeSource;
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::time::Duration;

fn create_arbiter() -> (PositionArbiter<ManualTimeSource>, ManualTimeSource) {
    let time = ManualTimeSource::default();
    (
        PositionArbiter::new_with_source(DEFAULT_DRIFT_WINDOW, time.clone()),
        time,
    )
}

#[test_log::test]
fn starts_unset() {
    let (arbiter, _) = create_arbiter();

    assert!(arbiter.current_position().is_unset());
    assert_eq!(arbiter.provenance(), PositionSource::Network);
    assert_eq!(arbiter.last_gps_fix_age(), None);
    assert!(!arbiter.has_moved());
}

#[test_log::test]
fn valid_gps_fix_is_accepted() {
    let (mut arbiter, time) = create_arbiter();
    time.set(Duration::from_secs(3));

    let result = arbiter.update_gps_fix(&GnssFix::new(10.0, 20.0, 120.0, 13.9, 7));

    assert_eq!(result, Arbitration::Accepted(PositionSource::Gps));
    let current = arbiter.current_position();
    assert_eq!((current.latitude(), current.longitude()), (10.0, 20.0));
    assert_eq!(current.altitude(), 120.0);
    assert_eq!(current.satellites(), 7);
    assert_eq!(current.captured_at_us(), 3_000_000);
    assert_eq!(arbiter.provenance(), PositionSource::Gps);
    assert_eq!(arbiter.last_gps_fix_age(), Some(Duration::ZERO));
    assert!(arbiter.has_moved());
}

#[test_log::test]
fn invalid_or_stale_gps_fix_is_ignored() {
    let (mut arbiter, _) = create_arbiter();

    assert_eq!(
        arbiter.update_gps_fix(&GnssFix::new(10.0, 20.0, 0.0, 0.0, 0).invalid()),
        Arbitration::Ignored
    );
    assert_eq!(
        arbiter.update_gps_fix(&GnssFix::new(10.0, 20.0, 0.0, 0.0, 4).stale()),
        Arbitration::Ignored
    );
    assert!(arbiter.current_position().is_unset());
    assert_eq!(arbiter.last_gps_fix_age(), None);
}

#[test_log::test]
fn network_fix_within_drift_window_is_rejected() {
    let (mut arbiter, time) = create_arbiter();
    arbiter.update_gps_fix(&GnssFix::new(10.0, 20.0, 0.0, 0.0, 6));

    time.set(Duration::from_micros(1_000_000));
    let result = arbiter.update_network_fix(11.0, 21.0, 30.0);

    assert_eq!(
        result,
        Arbitration::RejectedRecentGps {
            gps_age: Duration::from_secs(1)
        }
    );
    let current = arbiter.current_position();
    assert_eq!((current.latitude(), current.longitude()), (10.0, 20.0));
    assert_eq!(arbiter.provenance(), PositionSource::Gps);
}

#[test_log::test]
fn network_fix_bootstraps_an_unset_position() {
    let (mut arbiter, time) = create_arbiter();
    time.set(Duration::from_micros(17));

    let result = arbiter.update_network_fix(52.52, 13.405, 1500.0);

    assert_eq!(result, Arbitration::Accepted(PositionSource::Network));
    let current = arbiter.current_position();
    assert_eq!((current.latitude(), current.longitude()), (52.52, 13.405));
    assert_eq!(current.accuracy(), Some(1500.0));
    assert_eq!(arbiter.provenance(), PositionSource::Network);
}

#[test_log::test]
fn network_fix_is_accepted_after_the_drift_window() {
    let (mut arbiter, time) = create_arbiter();
    arbiter.update_gps_fix(&GnssFix::new(10.0, 20.0, 88.0, 4.0, 5));

    time.set(DEFAULT_DRIFT_WINDOW);
    assert!(!arbiter.update_network_fix(11.0, 21.0, 30.0).is_accepted());

    time.advance(Duration::from_micros(1));
    let result = arbiter.update_network_fix(11.0, 21.0, 30.0);

    assert_eq!(result, Arbitration::Accepted(PositionSource::Network));
    let current = arbiter.current_position();
    assert_eq!((current.latitude(), current.longitude()), (11.0, 21.0));
    assert_eq!(current.altitude(), 88.0);
    assert_eq!(current.speed(), 4.0);
    assert_eq!(current.satellites(), 5);
    let previous = arbiter.previous_position();
    assert_eq!((previous.latitude(), previous.longitude()), (10.0, 20.0));
    assert!(arbiter.has_moved());
    assert!((arbiter.distance_moved() - 155_941.0).abs() < 100.0);
}

#[test_log::test]
fn zero_network_fix_never_overwrites_a_position() {
    let (mut arbiter, time) = create_arbiter();
    arbiter.update_gps_fix(&GnssFix::new(10.0, 20.0, 0.0, 0.0, 5));
    time.set(Duration::from_secs(46));

    let result = arbiter.update_network_fix(0.0, 0.0, 0.0);

    assert_eq!(result, Arbitration::RejectedZeroCoordinates);
    let current = arbiter.current_position();
    assert!(!current.is_unset());
    assert_eq!((current.latitude(), current.longitude()), (10.0, 20.0));
    assert_eq!(arbiter.provenance(), PositionSource::Gps);
}

#[test_log::test]
fn zero_network_fix_does_not_bootstrap() {
    let (mut arbiter, _) = create_arbiter();

    assert_eq!(
        arbiter.update_network_fix(0.0, 0.0, 12.0),
        Arbitration::RejectedZeroCoordinates
    );
    assert!(arbiter.current_position().is_unset());
}

#[test_log::test]
fn network_fixes_do_not_reset_the_gps_clock() {
    let (mut arbiter, time) = create_arbiter();
    arbiter.update_gps_fix(&GnssFix::new(10.0, 20.0, 0.0, 0.0, 5));
    time.set(Duration::from_secs(50));
    assert!(arbiter.update_network_fix(11.0, 21.0, 30.0).is_accepted());

    time.set(Duration::from_secs(51));

    assert!(arbiter.update_network_fix(12.0, 22.0, 30.0).is_accepted());
    assert_eq!(arbiter.last_gps_fix_age(), Some(Duration::from_secs(51)));
}

#[test_log::test]
fn unchanged_position_has_not_moved() {
    let (mut arbiter, time) = create_arbiter();
    arbiter.update_gps_fix(&GnssFix::new(10.0, 20.0, 0.0, 0.0, 5));
    time.advance(Duration::from_secs(1));
    arbiter.update_gps_fix(&GnssFix::new(10.0, 20.0, 1.0, 0.0, 6));

    assert!(!arbiter.has_moved());
    assert_eq!(arbiter.distance_moved(), 0.0);
}

#[test_log::test]
fn network_acceptance_follows_gps_age_and_bootstrap() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let drift_window = Duration::from_micros(rng.random_range(1_000..60_000_000));
        let time = ManualTimeSource::default();
        let mut arbiter = PositionArbiter::new_with_source(drift_window, time.clone());
        let mut last_gps_us: Option<u64> = None;
        let mut now_us = 0u64;

        for _ in 0..200 {
            now_us += rng.random_range(0..2 * drift_window.as_micros() as u64);
            time.set(Duration::from_micros(now_us));
            let latitude = rng.random_range(-90.0..90.0);
            let longitude = rng.random_range(-180.0..180.0);
            let zero = rng.random_bool(0.1);

            if !zero && rng.random_bool(0.4) {
                let fix = GnssFix::new(latitude, longitude, 0.0, 0.0, 6);
                assert!(arbiter.update_gps_fix(&fix).is_accepted());
                last_gps_us = Some(now_us);
                continue;
            }

            let bootstrap = arbiter.current_position().is_unset();
            let expired = last_gps_us
                .is_none_or(|at| now_us - at > drift_window.as_micros() as u64);
            let before = *arbiter.current_position();
            let result = if zero {
                arbiter.update_network_fix(0.0, 0.0, 25.0)
            } else {
                arbiter.update_network_fix(latitude, longitude, 25.0)
            };

            assert_eq!(
                result.is_accepted(),
                !zero && (bootstrap || expired),
                "at {now_us} us"
            );
            if result.is_accepted() {
                assert_eq!(arbiter.current_position().latitude(), latitude);
                assert_eq!(arbiter.provenance(), PositionSource::Network);
            } else {
                assert_eq!(*arbiter.current_position(), before);
            }
        }
    }
}
