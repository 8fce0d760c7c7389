//! Timestamp sampling for issues and commits.
//!
//! Dates are drawn at minute granularity so they survive the
//! `%Y-%m-%dT%H:%M` document format unchanged.

use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDateTime, Timelike};
use rand::Rng;
use tracing::warn;

pub const MIN_PROPENSITY: f64 = 0.01;
pub const MAX_PROPENSITY: f64 = 0.95;
/// Propensity before the first scenario derives its own.
pub const INITIAL_PROPENSITY: f64 = 0.02;

#[derive(Debug, Clone)]
pub struct TemporalModel {
    start: NaiveDateTime,
    end: NaiveDateTime,
    closing_horizon: Duration,
    propensity: f64,
}

impl TemporalModel {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, closing_horizon: Duration) -> Result<Self> {
        if end < start {
            bail!("Date window end {} is before start {}", end, start);
        }
        if closing_horizon < Duration::zero() {
            bail!("Closing horizon must not be negative");
        }
        if end.checked_add_signed(closing_horizon).is_none() {
            bail!("Closing horizon reaches past the last representable date after {}", end);
        }
        Ok(TemporalModel {
            start: truncate_to_minute(start),
            end: truncate_to_minute(end),
            closing_horizon,
            propensity: INITIAL_PROPENSITY,
        })
    }

    /// Parses the window bounds with a chrono format string.
    pub fn parse(start: &str, end: &str, format: &str, closing_horizon: Duration) -> Result<Self> {
        let start = NaiveDateTime::parse_from_str(start, format)
            .with_context(|| format!("Invalid window start '{}' for format '{}'", start, format))?;
        let end = NaiveDateTime::parse_from_str(end, format)
            .with_context(|| format!("Invalid window end '{}' for format '{}'", end, format))?;
        Self::new(start, end, closing_horizon)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn propensity(&self) -> f64 {
        self.propensity
    }

    /// Uniform minute inside `[start, end]`.
    pub fn random_date<R: Rng + ?Sized>(&self, rng: &mut R) -> NaiveDateTime {
        let span = (self.end - self.start).num_minutes();
        self.start + Duration::minutes(rng.gen_range(0..=span))
    }

    /// A date at or after `creation`.
    ///
    /// The offset is `horizon * u^(1 / (1 - p))`: as the propensity grows
    /// the exponent does too and offsets collapse towards zero.
    pub fn random_closing_date<R: Rng + ?Sized>(
        &self,
        creation: NaiveDateTime,
        rng: &mut R,
    ) -> NaiveDateTime {
        let horizon = self.closing_horizon.num_minutes() as f64;
        let u: f64 = rng.gen();
        let exponent = 1.0 / (1.0 - self.propensity);
        let offset = (horizon * u.powf(exponent)).floor() as i64;
        Duration::try_minutes(offset.max(0))
            .and_then(|offset| creation.checked_add_signed(offset))
            .unwrap_or(creation)
    }

    /// Propensity for a scenario of the given size. Bigger scenarios get a
    /// smaller value and therefore a wider closing spread.
    pub fn derive_propensity(commit_count: usize, contributor_count: usize) -> f64 {
        let size = commit_count as f64 / 4.0 + contributor_count as f64 / 2.0;
        (1.0 / (1.0 + size)).clamp(MIN_PROPENSITY, MAX_PROPENSITY)
    }

    pub fn set_propensity(&mut self, propensity: f64) {
        if !propensity.is_finite() {
            warn!(propensity, "ignoring non-finite propensity");
            return;
        }
        self.propensity = propensity.clamp(MIN_PROPENSITY, MAX_PROPENSITY);
    }
}

fn truncate_to_minute(date: NaiveDateTime) -> NaiveDateTime {
    date.with_second(0)
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(date)
}
