use chrono::Datelike;
use serde::Serialize;

use crate::engine::error::EngineError;
use crate::engine::policy::{EntitlementPolicy, Quota};
use crate::model::leave_request::{LeaveCategory, LeaveRequest};

/// Used/remaining days of one category for one employee and policy year.
///
/// `used + remaining == total` while `used <= total`. Bookings can exceed a
/// finite quota after the quota is lowered or after approvals made without
/// revalidation; `used` then reports the real figure and `remaining` stays at 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entitlement {
    pub category: LeaveCategory,
    pub year: i32,
    pub used: u32,
    pub total: Quota,
    pub remaining: Quota,
    /// false when the category's eligibility precondition is not met
    pub requestable: bool,
}

/// Days booked against `category` in `year`: Pending and Approved count, Rejected does not.
/// A request belongs to the year its start date falls in.
pub fn used_days<'a>(
    requests: impl IntoIterator<Item = &'a LeaveRequest>,
    category: LeaveCategory,
    year: i32,
) -> u32 {
    requests
        .into_iter()
        .filter(|r| r.status.is_active() && r.category == category && r.start_date.year() == year)
        .map(|r| r.leave_days)
        .sum()
}

pub fn evaluate<'a>(
    policy: &EntitlementPolicy,
    category: LeaveCategory,
    year: i32,
    requests: impl IntoIterator<Item = &'a LeaveRequest>,
    requestable: bool,
) -> Entitlement {
    let total = policy.rule(category).quota;
    let used = used_days(requests, category, year);
    Entitlement {
        category,
        year,
        used,
        total,
        remaining: total.saturating_sub(used),
        requestable,
    }
}

/// Write-time enforcement of the quota.
pub fn ensure_fits(entitlement: &Entitlement, requested_days: u32) -> Result<(), EngineError> {
    match entitlement.remaining {
        Quota::Limited(remaining) if requested_days > remaining => Err(EngineError::QuotaExceeded(remaining)),
        _ => Ok(()),
    }
}
