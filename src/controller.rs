use crate::attempt::AttemptRecord;
use crate::category::Category;
use crate::error::{ProgressError, Result};
use crate::settings::ProgressionSettings;
use crate::window::{Window, WINDOW_CAPACITY};

/// Success rate at or above which the configuration counts as mastered
/// (18/20 = 90%).
const SUCCESS_THRESHOLD: usize = 18;
/// Lower edge of the stable corridor (14/20 = 70%). Between the two
/// thresholds nothing changes; the band exists to stop oscillation.
const STABLE_THRESHOLD: usize = 14;
/// Failures in a short warm-up window that count as an early, strong
/// de-escalation signal.
const WARMUP_FAILURE_TRIGGER: usize = 7;
/// Seconds of slack granted on top of the goal after a premise change.
const LEVEL_CHANGE_SLACK: u32 = 20;
/// How far past the goal the time budget may grow before failing attempts are
/// blamed on difficulty rather than time pressure.
const FAIL_MARGIN: u32 = 25;
/// Ceiling for the time budget after a fail pass.
const MAX_FAIL_SECONDS: u32 = 60;

/// Outcome of one evaluation. The same override pair is written to every
/// category in the triggering record's common group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Stable corridor, or warm-up still collecting.
    NoChange,
    /// Mastered: one more premise, generous time at the harder level.
    Escalate { premises: u32, seconds: u32 },
    /// Mastered on accuracy but not yet on speed: shrink the time budget.
    TightenTime { seconds: u32 },
    /// Struggling: grant more time at the same premise count.
    RelaxTime { seconds: u32 },
    /// Struggling despite a generous budget: one premise fewer.
    Deescalate { premises: u32, seconds: u32 },
}

impl Decision {
    /// Whether this evaluation changed difficulty settings (the signal the
    /// host app surfaces as a progression event).
    pub fn changed_settings(&self) -> bool {
        !matches!(self, Decision::NoChange)
    }

    /// Writes the decided override pair to every category in `group`,
    /// exactly once per category.
    pub fn apply_to(&self, settings: &mut ProgressionSettings, group: &[Category]) {
        for &category in group {
            match *self {
                Decision::NoChange => {}
                Decision::Escalate { premises, seconds }
                | Decision::Deescalate { premises, seconds } => {
                    settings.set_premises(category, premises);
                    settings.set_seconds(category, seconds);
                }
                Decision::TightenTime { seconds } | Decision::RelaxTime { seconds } => {
                    settings.set_seconds(category, seconds);
                }
            }
        }
    }
}

/// Decides what to do with the difficulty of the current configuration given
/// the trailing window. Pure: the same window, record and goal always yield
/// the same decision.
pub fn decide(window: &Window, current: &AttemptRecord, goal_seconds: u32) -> Result<Decision> {
    let seconds_allotted = current.seconds_allotted.ok_or_else(|| {
        ProgressError::MalformedRecord("cannot evaluate an untimed attempt".into())
    })?;

    if window.len() < WINDOW_CAPACITY {
        // Warm-up: not enough history to judge mastery, but a pile of early
        // failures is already a strong signal to back off.
        if window.failure_count() >= WARMUP_FAILURE_TRIGGER {
            return Ok(fail_decision(window, current, seconds_allotted, goal_seconds));
        }
        return Ok(Decision::NoChange);
    }

    let successes = window.success_count();
    if successes >= SUCCESS_THRESHOLD {
        Ok(success_decision(window, current, seconds_allotted, goal_seconds))
    } else if successes >= STABLE_THRESHOLD {
        Ok(Decision::NoChange)
    } else {
        Ok(fail_decision(window, current, seconds_allotted, goal_seconds))
    }
}

/// The k-th record counting from the slow end of an ascending-by-elapsed
/// sequence; `k == 1` is the slowest. Callers guarantee `k <= len`.
fn kth_from_slowest<'a>(sorted: &[&'a AttemptRecord], k: usize) -> &'a AttemptRecord {
    sorted[sorted.len() - k]
}

/// Precondition: at least 3 successes in the window. Only reachable from a
/// full window with at least `SUCCESS_THRESHOLD` successes.
fn success_decision(
    window: &Window,
    current: &AttemptRecord,
    seconds_allotted: u32,
    goal_seconds: u32,
) -> Decision {
    let successes = window.successes();
    debug_assert!(successes.len() >= 3);

    let min_upgrade = seconds_allotted.saturating_sub(1);
    // Approximate 90th-percentile completion time from the two
    // next-to-slowest successes, so a single slow outlier cannot dominate.
    let third = kth_from_slowest(&successes, 3).elapsed_ms as u128;
    let second = kth_from_slowest(&successes, 2).elapsed_ms as u128;
    let percentile90ish = u32::try_from((third + second) / 2000 + 1).unwrap_or(u32::MAX);
    let candidate = min_upgrade.min(percentile90ish);

    let total_ms: f64 = successes.iter().map(|r| r.elapsed_ms as f64).sum();
    let average_seconds = total_ms / successes.len() as f64 / 1000.0;

    if average_seconds <= goal_seconds as f64 || candidate <= goal_seconds {
        Decision::Escalate {
            premises: current.premises + 1,
            seconds: goal_seconds + LEVEL_CHANGE_SLACK,
        }
    } else {
        Decision::TightenTime { seconds: candidate }
    }
}

fn fail_decision(
    window: &Window,
    current: &AttemptRecord,
    seconds_allotted: u32,
    goal_seconds: u32,
) -> Decision {
    let ratio = window.success_count() as f64 / window.len() as f64;
    let slack = if ratio <= 0.5 { 10 } else { 5 };
    let candidate = seconds_allotted.saturating_add(slack);

    if candidate > goal_seconds + FAIL_MARGIN {
        // The budget is already far beyond the target; time pressure is not
        // the obstacle, the premise count is.
        if current.premises > 2 {
            Decision::Deescalate {
                premises: current.premises - 1,
                seconds: goal_seconds + LEVEL_CHANGE_SLACK,
            }
        } else {
            Decision::RelaxTime {
                seconds: candidate.min(MAX_FAIL_SECONDS),
            }
        }
    } else {
        Decision::RelaxTime { seconds: candidate }
    }
}
