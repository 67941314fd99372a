//! Sliding-window call budget for a quote provider.
//!
//! Two independent ceilings are enforced: calls in the trailing 60 seconds and
//! calls within the current UTC calendar day. Timestamps are kept in a single
//! ordered queue and pruned to the last 24 hours on every access.
//!
//! The budget is per process. Several instances behind a load balancer each
//! carry their own, so the ceiling is advisory rather than global.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, NaiveTime, Utc};
use log::{debug, warn};

use crate::provider::RateLimit;

/// The two ceilings of a [`RateBudget`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BudgetLimits {
    pub per_minute: u32,
    pub per_day: u32,
}

impl From<RateLimit> for BudgetLimits {
    fn from(limit: RateLimit) -> Self {
        Self {
            per_minute: limit.requests_per_minute,
            per_day: limit.requests_per_day,
        }
    }
}

/// Which ceiling stopped a call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BudgetWindow {
    Minute,
    Day,
}

/// Returned when a call would exceed a ceiling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BudgetExhausted {
    pub window: BudgetWindow,
    /// Earliest moment at which a call fits into every ceiling again.
    pub reset_at: DateTime<Utc>,
}

/// Calls counted in each window at a given moment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BudgetUsage {
    pub minute: u32,
    pub day: u32,
}

/// Per-process call accounting with minute and UTC-day ceilings.
pub struct RateBudget {
    limits: BudgetLimits,
    calls: Mutex<VecDeque<DateTime<Utc>>>,
}

impl RateBudget {
    /// Create a budget. Ceilings below 1 are raised to 1.
    pub fn new(limits: BudgetLimits) -> Self {
        Self {
            limits: BudgetLimits {
                per_minute: limits.per_minute.max(1),
                per_day: limits.per_day.max(1),
            },
            calls: Mutex::new(VecDeque::new()),
        }
    }

    pub fn limits(&self) -> BudgetLimits {
        self.limits
    }

    /// Lock the call log, recovering from poison if necessary.
    ///
    /// A poisoned log at worst miscounts a call, which beats failing every
    /// subsequent quote lookup.
    fn lock_calls(&self) -> MutexGuard<'_, VecDeque<DateTime<Utc>>> {
        self.calls.lock().unwrap_or_else(|poisoned| {
            warn!("Rate budget mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn prune(calls: &mut VecDeque<DateTime<Utc>>, now: DateTime<Utc>) {
        let horizon = now - Duration::hours(24);
        while calls.front().is_some_and(|t| *t <= horizon) {
            calls.pop_front();
        }
    }

    fn in_minute(t: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        t <= now && now - t < Duration::seconds(60)
    }

    fn in_day(t: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        t.date_naive() == now.date_naive()
    }

    fn usage_of(calls: &VecDeque<DateTime<Utc>>, now: DateTime<Utc>) -> BudgetUsage {
        let minute = calls.iter().filter(|t| Self::in_minute(**t, now)).count();
        let day = calls.iter().filter(|t| Self::in_day(**t, now)).count();
        BudgetUsage {
            minute: u32::try_from(minute).unwrap_or(u32::MAX),
            day: u32::try_from(day).unwrap_or(u32::MAX),
        }
    }

    fn evaluate(
        &self,
        calls: &VecDeque<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<(), BudgetExhausted> {
        let usage = Self::usage_of(calls, now);
        let minute_full = usage.minute >= self.limits.per_minute;
        let day_full = usage.day >= self.limits.per_day;
        if !minute_full && !day_full {
            return Ok(());
        }

        let mut exhausted: Option<BudgetExhausted> = None;

        if minute_full {
            // The window frees up once enough of the oldest calls age out.
            let window: Vec<_> = calls.iter().filter(|t| Self::in_minute(**t, now)).collect();
            let excess = (usage.minute - self.limits.per_minute) as usize;
            let reset_at = window
                .get(excess)
                .map(|t| **t + Duration::seconds(60))
                .unwrap_or(now + Duration::seconds(60));
            exhausted = Some(BudgetExhausted {
                window: BudgetWindow::Minute,
                reset_at,
            });
        }

        if day_full {
            let next_midnight = (now.date_naive() + Duration::days(1))
                .and_time(NaiveTime::MIN)
                .and_utc();
            if exhausted.map_or(true, |e| next_midnight > e.reset_at) {
                exhausted = Some(BudgetExhausted {
                    window: BudgetWindow::Day,
                    reset_at: next_midnight,
                });
            }
        }

        match exhausted {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Check both ceilings and, if a call fits, record it in the same step.
    /// A refused call is not recorded.
    pub fn try_acquire(&self, now: DateTime<Utc>) -> Result<(), BudgetExhausted> {
        let mut calls = self.lock_calls();
        Self::prune(&mut calls, now);
        self.evaluate(&calls, now)?;
        calls.push_back(now);
        debug!(
            "Rate budget: call recorded ({} in log, limits {}/min {}/day)",
            calls.len(),
            self.limits.per_minute,
            self.limits.per_day
        );
        Ok(())
    }

    pub fn usage(&self, now: DateTime<Utc>) -> BudgetUsage {
        let mut calls = self.lock_calls();
        Self::prune(&mut calls, now);
        Self::usage_of(&calls, now)
    }
}
