//! Per-session quota bookkeeping.
//!
//! Each free vendor tier has a published quota (Alpha Vantage: 5 calls a
//! minute; Barchart: 150 history calls a day; IB: 60 historical requests per
//! ten minutes). A [`Session`] tracks two things per provider:
//!
//! - a local `governor` limiter built from that quota, so we stop before the
//!   vendor does, and
//! - a "limit reached until" mark set when the vendor itself says no.
//!
//! A refused admission is reported as a quota status by the adapter. Nothing
//! here sleeps or retries.

use std::{collections::HashMap, sync::Mutex, time::Duration};

use chrono::{DateTime, Days, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use tracing::debug;

use crate::providers::ProviderKind;

/// Quota context shared by the calls of one caller.
pub struct Session {
    limiters: HashMap<ProviderKind, DefaultDirectRateLimiter>,
    limit_reached: Mutex<HashMap<ProviderKind, DateTime<Utc>>>,
    time_zone: Tz,
    fixed_now: Option<DateTime<Utc>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A session with each vendor's published free-tier quota.
    pub fn new() -> Self {
        let mut limiters = HashMap::new();
        limiters.insert(
            ProviderKind::AlphaVantage,
            RateLimiter::direct(Quota::per_minute(nonzero!(5u32))),
        );
        if let Some(q) = Quota::with_period(Duration::from_secs(86_400 / 150)) {
            limiters.insert(
                ProviderKind::Barchart,
                RateLimiter::direct(q.allow_burst(nonzero!(150u32))),
            );
        }
        if let Some(q) = Quota::with_period(Duration::from_secs(10)) {
            limiters.insert(
                ProviderKind::Ib,
                RateLimiter::direct(q.allow_burst(nonzero!(60u32))),
            );
        }
        Self {
            limiters,
            ..Self::unlimited()
        }
    }

    /// A session with no local limiters; vendor refusals are still tracked.
    pub fn unlimited() -> Self {
        Self {
            limiters: HashMap::new(),
            limit_reached: Mutex::new(HashMap::new()),
            time_zone: chrono_tz::America::New_York,
            fixed_now: None,
        }
    }

    /// Overrides the local quota for one provider.
    pub fn with_quota(mut self, kind: ProviderKind, quota: Quota) -> Self {
        self.limiters.insert(kind, RateLimiter::direct(quota));
        self
    }

    /// Exchange time zone used for "now" defaults. US/Eastern unless set.
    pub fn with_time_zone(mut self, tz: Tz) -> Self {
        self.time_zone = tz;
        self
    }

    /// Pins the clock, for reproducible windows.
    pub fn with_fixed_now(mut self, now: DateTime<Utc>) -> Self {
        self.fixed_now = Some(now);
        self
    }

    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    pub fn now_utc(&self) -> DateTime<Utc> {
        self.fixed_now.unwrap_or_else(Utc::now)
    }

    /// Current exchange-local wall time.
    pub fn local_now(&self) -> NaiveDateTime {
        self.now_utc().with_timezone(&self.time_zone).naive_local()
    }

    /// Start of the next exchange-local calendar day, in UTC. Daily vendor
    /// quotas reset here.
    pub fn next_local_midnight(&self) -> DateTime<Utc> {
        let tomorrow = self.local_now().date() + Days::new(1);
        self.time_zone
            .from_local_datetime(&tomorrow.and_time(NaiveTime::MIN))
            .earliest()
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|| self.now_utc() + TimeDelta::days(1))
    }

    /// Asks whether a request to `kind` may go out now.
    ///
    /// `Err` carries a message suitable for a quota status.
    pub fn admit(&self, kind: ProviderKind) -> Result<(), String> {
        if let Some(until) = self.limit_reached_until(kind) {
            return Err(format!(
                "{kind} daily/rate limit was reached; requests resume after {until}"
            ));
        }
        if let Some(limiter) = self.limiters.get(&kind) {
            if limiter.check().is_err() {
                return Err(format!("local {kind} request quota exhausted; try again later"));
            }
        }
        Ok(())
    }

    /// Records that the vendor refused service until `until`.
    pub fn mark_limit_reached(&self, kind: ProviderKind, until: DateTime<Utc>) {
        debug!(provider = %kind, %until, "vendor limit reached");
        if let Ok(mut map) = self.limit_reached.lock() {
            map.insert(kind, until);
        }
    }

    pub fn is_limit_reached(&self, kind: ProviderKind) -> bool {
        self.limit_reached_until(kind).is_some()
    }

    /// The reset time if the limit is still in force. Expired marks are
    /// cleared on read.
    pub fn limit_reached_until(&self, kind: ProviderKind) -> Option<DateTime<Utc>> {
        let now = self.now_utc();
        let mut map = self.limit_reached.lock().ok()?;
        match map.get(&kind).copied() {
            Some(until) if now <= until => Some(until),
            Some(_) => {
                map.remove(&kind);
                None
            }
            None => None,
        }
    }
}
