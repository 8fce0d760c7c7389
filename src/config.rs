use anyhow::{bail, Context, Result};
use chrono::Duration;
use std::num::NonZeroUsize;

use crate::pool::PoolCaps;
use crate::temporal::TemporalModel;

pub const DEFAULT_DATE_START: &str = "2015-4-12T4:30";
pub const DEFAULT_DATE_END: &str = "2018-9-12T8:30";
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M";
pub const DEFAULT_CLOSING_HORIZON_DAYS: i64 = 365;
pub const DEFAULT_MAX_COMMITS: usize = 25;

/// Inputs of a generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Opaque tag copied into every node document.
    pub account_id: String,
    pub private: bool,
    pub date_start: String,
    pub date_end: String,
    pub date_format: String,
    pub closing_horizon_days: i64,
    pub caps: PoolCaps,
    /// Upper bound of the per-scenario commit chain length.
    pub max_commits: usize,
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            account_id: "1".to_string(),
            private: true,
            date_start: DEFAULT_DATE_START.to_string(),
            date_end: DEFAULT_DATE_END.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            closing_horizon_days: DEFAULT_CLOSING_HORIZON_DAYS,
            caps: PoolCaps::default(),
            max_commits: DEFAULT_MAX_COMMITS,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    pub fn with_caps(mut self, contributors: usize, repositories: usize) -> Result<Self> {
        let (Some(contributors), Some(repositories)) =
            (NonZeroUsize::new(contributors), NonZeroUsize::new(repositories))
        else {
            bail!("Pool caps must be at least 1");
        };
        self.caps = PoolCaps {
            contributors,
            repositories,
        };
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_commits == 0 {
            bail!("max_commits must be at least 1");
        }
        if self.closing_horizon_days < 0 {
            bail!("closing_horizon_days must not be negative");
        }
        self.temporal_model()?;
        Ok(())
    }

    pub fn temporal_model(&self) -> Result<TemporalModel> {
        let horizon = Duration::try_days(self.closing_horizon_days).with_context(|| {
            format!("closing_horizon_days {} is out of range", self.closing_horizon_days)
        })?;
        TemporalModel::parse(&self.date_start, &self.date_end, &self.date_format, horizon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(GeneratorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_cap_rejected() {
        let result = GeneratorConfig::default().with_caps(0, 10);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("at least 1"));
    }

    #[test]
    fn test_with_caps() {
        let config = GeneratorConfig::default().with_caps(5, 2).unwrap();
        assert_eq!(config.caps.contributors.get(), 5);
        assert_eq!(config.caps.repositories.get(), 2);
    }

    #[test]
    fn test_zero_max_commits_rejected() {
        let config = GeneratorConfig {
            max_commits: 0,
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_huge_closing_horizon_rejected() {
        for days in [i64::MAX / 2, 200_000_000] {
            let config = GeneratorConfig {
                closing_horizon_days: days,
                ..GeneratorConfig::default()
            };
            assert!(config.validate().is_err(), "{} days passed validation", days);
        }
    }

    #[test]
    fn test_bad_window_rejected() {
        let config = GeneratorConfig {
            date_start: "2019-1-1T0:00".to_string(),
            ..GeneratorConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("before start"));
    }
}
