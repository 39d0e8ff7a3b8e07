use std::time::Duration;

use time::OffsetDateTime;

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allowed,
    Blocked { remaining_millis: u64 },
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allowed)
    }

    /// Remaining wait in whole seconds, rounded up. Zero when allowed.
    pub fn remaining_secs(&self) -> u64 {
        match self {
            GuardDecision::Allowed => 0,
            GuardDecision::Blocked { remaining_millis } => remaining_millis.div_ceil(1000),
        }
    }
}

/// Decides whether a submission may be accepted `cooldown_millis` after the last one.
///
/// A clock that moved backwards counts as zero elapsed time. The remaining wait
/// is reported rounded up to whole seconds.
pub fn check_cooldown(
    now_millis: i64,
    last_accepted_millis: Option<i64>,
    cooldown_millis: u64,
) -> GuardDecision {
    let Some(last) = last_accepted_millis else {
        return GuardDecision::Allowed;
    };
    let elapsed = now_millis.saturating_sub(last).max(0) as u64;
    if elapsed >= cooldown_millis {
        return GuardDecision::Allowed;
    }
    let remaining = cooldown_millis - elapsed;
    GuardDecision::Blocked {
        remaining_millis: remaining.div_ceil(1000) * 1000,
    }
}

/// Wall-clock wrapper around [`check_cooldown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownGuard {
    cooldown: Duration,
}

impl Default for CooldownGuard {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

impl CooldownGuard {
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn check(&self, now: OffsetDateTime, last_accepted: Option<OffsetDateTime>) -> GuardDecision {
        let decision = check_cooldown(
            unix_millis(now),
            last_accepted.map(unix_millis),
            self.cooldown.as_millis().min(u64::MAX as u128) as u64,
        );
        if let GuardDecision::Blocked { remaining_millis } = decision {
            tracing::debug!(remaining_millis, "submission blocked by cooldown");
        }
        decision
    }
}

fn unix_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}
