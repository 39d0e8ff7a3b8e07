use std::time::Duration;

use time::macros::datetime;

use intake_spec::{CooldownGuard, GuardDecision, check_cooldown};

#[test]
fn first_submission_is_allowed() {
    assert_eq!(check_cooldown(1_000, None, 30_000), GuardDecision::Allowed);
}

#[test]
fn blocks_inside_cooldown() {
    let last = 1_700_000_000_000;
    let decision = check_cooldown(last + 10_000, Some(last), 30_000);
    assert_eq!(
        decision,
        GuardDecision::Blocked {
            remaining_millis: 20_000
        }
    );
    assert_eq!(decision.remaining_secs(), 20);
}

#[test]
fn allows_after_cooldown() {
    let last = 1_700_000_000_000;
    assert!(check_cooldown(last + 30_001, Some(last), 30_000).is_allowed());
    assert!(check_cooldown(last + 30_000, Some(last), 30_000).is_allowed());
}

#[test]
fn remaining_rounds_up_to_whole_seconds() {
    let decision = check_cooldown(10_500, Some(0), 30_000);
    assert_eq!(
        decision,
        GuardDecision::Blocked {
            remaining_millis: 20_000
        }
    );
    let decision = check_cooldown(29_999, Some(0), 30_000);
    assert_eq!(decision.remaining_secs(), 1);
}

#[test]
fn clock_skew_counts_as_no_time_elapsed() {
    let decision = check_cooldown(0, Some(5_000), 30_000);
    assert_eq!(decision.remaining_secs(), 30);
}

#[test]
fn wall_clock_guard() {
    let guard = CooldownGuard::new(Duration::from_secs(30));
    let last = datetime!(2024-05-01 12:00:00 UTC);
    assert!(!guard.check(datetime!(2024-05-01 12:00:10 UTC), Some(last)).is_allowed());
    assert!(guard.check(datetime!(2024-05-01 12:00:31 UTC), Some(last)).is_allowed());
    assert!(CooldownGuard::default().check(last, None).is_allowed());
}
