use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::model::request::{Decision, EmployeeId, RequestStatus};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeaveCategory {
    SickLeave,
    PersonalLeave,
    AnnualLeave,
    UnpaidLeave,
    OtherLeave,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = "4f2b6a1e-8c1d-4a43-9a55-5d0f3c9e7b21", value_type = String)]
    pub id: Uuid,
    #[schema(example = 1000)]
    pub employee_id: EmployeeId,
    #[schema(example = "2026-01-01T08:00:00Z", format = "date-time", value_type = String)]
    pub requested_at: DateTime<Utc>,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-07", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub category: LeaveCategory,
    /// working days in [start_date, end_date], weekends and public holidays excluded
    #[schema(example = 3)]
    pub leave_days: u32,
    #[schema(example = "Family matters", nullable = true)]
    pub reason: Option<String>,
    pub status: RequestStatus,
    #[schema(nullable = true)]
    pub decision: Option<Decision>,
}

/// Validated submission input, before it becomes a ledger entry.
#[derive(Debug, Clone)]
pub struct NewLeave {
    pub employee_id: EmployeeId,
    pub category: LeaveCategory,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
}

impl LeaveRequest {
    pub fn pending(new: NewLeave, leave_days: u32, requested_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            employee_id: new.employee_id,
            requested_at,
            start_date: new.start_date,
            end_date: new.end_date,
            category: new.category,
            leave_days,
            reason: new.reason,
            status: RequestStatus::Pending,
            decision: None,
        }
    }
}
