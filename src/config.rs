use anyhow::{Context, anyhow, bail};
use chrono::{FixedOffset, NaiveDate};
use dotenvy::dotenv;
use std::collections::BTreeSet;
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::engine::policy::{Eligibility, EnginePolicy, Quota};
use crate::model::leave_request::LeaveCategory;

/// Where requests are stored and employees looked up.
#[derive(Clone, Debug, PartialEq)]
pub enum LedgerBackend {
    MySql { database_url: String },
    Memory { employee_seed_file: PathBuf },
}

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    pub api_prefix: String,
    pub jwt_secret: String,
    pub log_dir: String,
    pub log_level: tracing::Level,

    pub backend: LedgerBackend,
    pub lock_timeout: Duration,
    pub employee_cache_ttl: Duration,

    // Rate limiting
    pub rate_submit_per_min: u32,
    pub rate_protected_per_min: u32,

    /// Offset whose calendar date is "today"
    pub business_offset: FixedOffset,
    pub policy: EnginePolicy,
}

fn parse<T>(key: &str, raw: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| anyhow!("{} has invalid value {:?}: {}", key, raw, e))
}

fn comma_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|item| !item.is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| lookup(key).with_context(|| format!("{} must be set", key));
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let number = |key: &str, default: &str| -> anyhow::Result<u32> { parse(key, &or_default(key, default)) };

        let backend = match or_default("LEDGER_BACKEND", "mysql").as_str() {
            "mysql" => LedgerBackend::MySql {
                database_url: required("DATABASE_URL")?,
            },
            "memory" => LedgerBackend::Memory {
                employee_seed_file: required("EMPLOYEE_SEED_FILE")?.into(),
            },
            other => bail!("LEDGER_BACKEND must be mysql or memory, got {:?}", other),
        };

        let offset_minutes: i32 = parse("BUSINESS_UTC_OFFSET_MINUTES", &or_default("BUSINESS_UTC_OFFSET_MINUTES", "420"))?;
        let business_offset = FixedOffset::east_opt(offset_minutes * 60)
            .with_context(|| format!("BUSINESS_UTC_OFFSET_MINUTES out of range: {}", offset_minutes))?;

        let rate_submit_per_min = number("RATE_SUBMIT_PER_MIN", "5")?;
        let rate_protected_per_min = number("RATE_PROTECTED_PER_MIN", "1000")?;
        if rate_submit_per_min == 0 || rate_protected_per_min == 0 {
            bail!("rate limits must be at least 1 request per minute");
        }

        let mut policy = EnginePolicy::default();
        for (key, category) in [
            ("QUOTA_SICK_LEAVE", LeaveCategory::SickLeave),
            ("QUOTA_PERSONAL_LEAVE", LeaveCategory::PersonalLeave),
            ("QUOTA_ANNUAL_LEAVE", LeaveCategory::AnnualLeave),
        ] {
            if let Some(raw) = lookup(key) {
                policy.entitlements.rule_mut(category).quota = parse::<Quota>(key, &raw)?;
            }
        }
        policy.entitlements.rule_mut(LeaveCategory::AnnualLeave).eligibility = Eligibility::MinimumTenure {
            months: number("ANNUAL_LEAVE_MIN_TENURE_MONTHS", "12")?,
        };

        policy.capacity.daily_cap = number("WFH_DAILY_CAP", "3")?;
        policy.capacity.monthly_cap = number("WFH_MONTHLY_CAP", "6")?;
        policy.capacity.specialist_monthly_cap = number("WFH_SPECIALIST_MONTHLY_CAP", "16")?;
        policy.capacity.specialist_positions = comma_list(&or_default("WFH_SPECIALIST_POSITIONS", "IT"))
            .map(str::to_string)
            .collect();
        policy.capacity.min_tenure_months = number("WFH_MIN_TENURE_MONTHS", "3")?;

        policy.holidays = comma_list(&or_default("PUBLIC_HOLIDAYS", ""))
            .map(|day| parse::<NaiveDate>("PUBLIC_HOLIDAYS", day))
            .collect::<anyhow::Result<BTreeSet<_>>>()?;
        policy.upcoming_window_days = number("UPCOMING_WINDOW_DAYS", "3")?;
        policy.report_grace_days = parse("REPORT_GRACE_DAYS", &or_default("REPORT_GRACE_DAYS", "2"))?;
        policy.revalidate_on_approval = parse("REVALIDATE_ON_APPROVAL", &or_default("REVALIDATE_ON_APPROVAL", "true"))?;

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            api_prefix: or_default("API_PREFIX", "/api"),
            jwt_secret: required("JWT_SECRET")?,
            log_dir: or_default("LOG_DIR", "logs"),
            log_level: parse("LOG_LEVEL", &or_default("LOG_LEVEL", "debug"))?,

            backend,
            lock_timeout: Duration::from_millis(parse("LOCK_TIMEOUT_MS", &or_default("LOCK_TIMEOUT_MS", "5000"))?),
            employee_cache_ttl: Duration::from_secs(parse(
                "EMPLOYEE_CACHE_TTL_SECS",
                &or_default("EMPLOYEE_CACHE_TTL_SECS", "300"),
            )?),

            rate_submit_per_min,
            rate_protected_per_min,

            business_offset,
            policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    const BASE: [(&str, &str); 3] = [
        ("SERVER_ADDR", "127.0.0.1:8080"),
        ("JWT_SECRET", "secret"),
        ("DATABASE_URL", "mysql://hr@localhost/hr"),
    ];

    #[test]
    fn defaults_match_the_house_policy() {
        let config = config(&BASE).unwrap();
        assert_eq!(config.api_prefix, "/api");
        assert_eq!(
            config.backend,
            LedgerBackend::MySql {
                database_url: "mysql://hr@localhost/hr".to_string()
            }
        );
        assert_eq!(config.lock_timeout, Duration::from_millis(5000));
        assert_eq!(config.log_level, tracing::Level::DEBUG);
        assert_eq!(config.business_offset.local_minus_utc(), 7 * 3600);
        assert_eq!(config.policy, EnginePolicy::default());
    }

    #[test]
    fn policy_overrides_are_applied() {
        let mut pairs = BASE.to_vec();
        pairs.extend([
            ("QUOTA_SICK_LEAVE", "unlimited"),
            ("QUOTA_ANNUAL_LEAVE", "12"),
            ("WFH_DAILY_CAP", "5"),
            ("WFH_SPECIALIST_POSITIONS", "IT, Data Engineer"),
            ("PUBLIC_HOLIDAYS", "2025-01-01, 2025-04-30"),
            ("REVALIDATE_ON_APPROVAL", "false"),
            ("LOG_LEVEL", "warn"),
        ]);
        let config = config(&pairs).unwrap();
        let policy = &config.policy;
        assert_eq!(policy.entitlements.rule(LeaveCategory::SickLeave).quota, Quota::Unlimited);
        assert_eq!(policy.entitlements.rule(LeaveCategory::AnnualLeave).quota, Quota::Limited(12));
        assert_eq!(policy.capacity.daily_cap, 5);
        assert_eq!(policy.capacity.specialist_positions, vec!["IT", "Data Engineer"]);
        assert_eq!(policy.holidays.len(), 2);
        assert!(!policy.revalidate_on_approval);
        assert_eq!(config.log_level, tracing::Level::WARN);
    }

    #[test]
    fn memory_backend_needs_a_seed_file() {
        let pairs = [
            ("SERVER_ADDR", "127.0.0.1:8080"),
            ("JWT_SECRET", "secret"),
            ("LEDGER_BACKEND", "memory"),
        ];
        let err = config(&pairs).err().unwrap();
        assert!(err.to_string().contains("EMPLOYEE_SEED_FILE"));
    }

    #[test]
    fn bad_values_name_their_key() {
        let mut pairs = BASE.to_vec();
        pairs.push(("WFH_MONTHLY_CAP", "six"));
        let err = config(&pairs).err().unwrap();
        assert!(err.to_string().contains("WFH_MONTHLY_CAP"));

        let mut pairs = BASE.to_vec();
        pairs.push(("RATE_SUBMIT_PER_MIN", "0"));
        assert!(config(&pairs).is_err());
    }
}
