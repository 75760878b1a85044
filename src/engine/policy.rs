use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::engine::calendar::months_before;
use crate::model::leave_request::LeaveCategory;

/// Annual allowance for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quota {
    Limited(u32),
    Unlimited,
}

impl Quota {
    pub fn saturating_sub(self, used: u32) -> Quota {
        match self {
            Quota::Limited(total) => Quota::Limited(total.saturating_sub(used)),
            Quota::Unlimited => Quota::Unlimited,
        }
    }
}

impl fmt::Display for Quota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quota::Limited(days) => write!(f, "{}", days),
            Quota::Unlimited => f.write_str("unlimited"),
        }
    }
}

impl FromStr for Quota {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("unlimited") {
            return Ok(Quota::Unlimited);
        }
        s.trim()
            .parse::<u32>()
            .map(Quota::Limited)
            .map_err(|_| format!("quota must be a number of days or \"unlimited\", got {:?}", s))
    }
}

// days as a JSON number, otherwise the string "unlimited"
impl Serialize for Quota {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Quota::Limited(days) => serializer.serialize_u32(*days),
            Quota::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Always,
    MinimumTenure { months: u32 },
}

impl Eligibility {
    pub fn is_met(&self, hire_date: NaiveDate, today: NaiveDate) -> bool {
        match self {
            Eligibility::Always => true,
            Eligibility::MinimumTenure { months } => hire_date <= months_before(today, *months),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryRule {
    pub quota: Quota,
    pub eligibility: Eligibility,
    pub requires_reason: bool,
}

/// Per-category rules. One field per category so a missing rule is a compile error.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitlementPolicy {
    pub sick: CategoryRule,
    pub personal: CategoryRule,
    pub annual: CategoryRule,
    pub unpaid: CategoryRule,
    pub other: CategoryRule,
}

impl Default for EntitlementPolicy {
    fn default() -> Self {
        Self {
            sick: CategoryRule {
                quota: Quota::Limited(30),
                eligibility: Eligibility::Always,
                requires_reason: false,
            },
            personal: CategoryRule {
                quota: Quota::Limited(6),
                eligibility: Eligibility::Always,
                requires_reason: true,
            },
            annual: CategoryRule {
                quota: Quota::Limited(6),
                eligibility: Eligibility::MinimumTenure { months: 12 },
                requires_reason: false,
            },
            unpaid: CategoryRule {
                quota: Quota::Unlimited,
                eligibility: Eligibility::Always,
                requires_reason: false,
            },
            other: CategoryRule {
                quota: Quota::Unlimited,
                eligibility: Eligibility::Always,
                requires_reason: true,
            },
        }
    }
}

impl EntitlementPolicy {
    pub fn rule(&self, category: LeaveCategory) -> &CategoryRule {
        match category {
            LeaveCategory::SickLeave => &self.sick,
            LeaveCategory::PersonalLeave => &self.personal,
            LeaveCategory::AnnualLeave => &self.annual,
            LeaveCategory::UnpaidLeave => &self.unpaid,
            LeaveCategory::OtherLeave => &self.other,
        }
    }

    pub fn rule_mut(&mut self, category: LeaveCategory) -> &mut CategoryRule {
        match category {
            LeaveCategory::SickLeave => &mut self.sick,
            LeaveCategory::PersonalLeave => &mut self.personal,
            LeaveCategory::AnnualLeave => &mut self.annual,
            LeaveCategory::UnpaidLeave => &mut self.unpaid,
            LeaveCategory::OtherLeave => &mut self.other,
        }
    }
}

/// Shared remote-work limits.
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityPolicy {
    pub daily_cap: u32,
    pub monthly_cap: u32,
    pub specialist_monthly_cap: u32,
    /// job-title words (case-insensitive) that get `specialist_monthly_cap`
    pub specialist_positions: Vec<String>,
    pub min_tenure_months: u32,
}

impl Default for CapacityPolicy {
    fn default() -> Self {
        Self {
            daily_cap: 3,
            monthly_cap: 6,
            specialist_monthly_cap: 16,
            specialist_positions: vec!["IT".to_string()],
            min_tenure_months: 3,
        }
    }
}

impl CapacityPolicy {
    /// Monthly cap for a job title. Keywords match whole words, so "IT Support"
    /// is a specialist position and "Recruitment Officer" is not.
    pub fn monthly_cap_for(&self, position: &str) -> u32 {
        let words: Vec<&str> = position
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let is_specialist = self.specialist_positions.iter().any(|keyword| {
            let keyword_words: Vec<&str> = keyword.split_whitespace().collect();
            !keyword_words.is_empty()
                && words.windows(keyword_words.len()).any(|window| {
                    window
                        .iter()
                        .zip(&keyword_words)
                        .all(|(w, k)| w.eq_ignore_ascii_case(k))
                })
        });
        if is_specialist {
            self.specialist_monthly_cap
        } else {
            self.monthly_cap
        }
    }

    pub fn wfh_eligibility(&self) -> Eligibility {
        Eligibility::MinimumTenure {
            months: self.min_tenure_months,
        }
    }
}

/// Everything the engine needs to decide a request, loaded once from config.
#[derive(Debug, Clone, PartialEq)]
pub struct EnginePolicy {
    pub entitlements: EntitlementPolicy,
    pub capacity: CapacityPolicy,
    pub holidays: BTreeSet<NaiveDate>,
    pub upcoming_window_days: u32,
    pub report_grace_days: i64,
    pub revalidate_on_approval: bool,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            entitlements: EntitlementPolicy::default(),
            capacity: CapacityPolicy::default(),
            holidays: BTreeSet::new(),
            upcoming_window_days: 3,
            report_grace_days: 2,
            revalidate_on_approval: true,
        }
    }
}
