use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::model::leave_request::LeaveRequest;
use crate::model::wfh_request::WfhRequest;

/// Employee id as issued by the employee directory.
pub type EmployeeId = u64;
/// User id of an approver (HR/Admin account).
pub type UserId = u64;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    /// Pending and Approved requests hold dates, quota and capacity.
    pub fn is_active(self) -> bool {
        matches!(self, RequestStatus::Pending | RequestStatus::Approved)
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

/// Audit trail written by the approve/reject transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Decision {
    #[schema(example = 7)]
    pub approver_id: UserId,
    #[schema(example = "2026-01-01T09:30:00Z", format = "date-time", value_type = String)]
    pub decided_at: DateTime<Utc>,
    #[schema(example = "Enjoy your break", nullable = true)]
    pub note: Option<String>,
}

/// Either kind of ledger entry, for views that mix them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Request {
    Leave(LeaveRequest),
    Wfh(WfhRequest),
}

impl Request {
    pub fn id(&self) -> Uuid {
        match self {
            Request::Leave(r) => r.id,
            Request::Wfh(r) => r.id,
        }
    }

    pub fn employee_id(&self) -> EmployeeId {
        match self {
            Request::Leave(r) => r.employee_id,
            Request::Wfh(r) => r.employee_id,
        }
    }

    pub fn status(&self) -> RequestStatus {
        match self {
            Request::Leave(r) => r.status,
            Request::Wfh(r) => r.status,
        }
    }

    /// Inclusive date span; a WFH day is a one-day span.
    pub fn span(&self) -> (NaiveDate, NaiveDate) {
        match self {
            Request::Leave(r) => (r.start_date, r.end_date),
            Request::Wfh(r) => (r.wfh_date, r.wfh_date),
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        self.span().0
    }
}

impl From<LeaveRequest> for Request {
    fn from(value: LeaveRequest) -> Self {
        Request::Leave(value)
    }
}

impl From<WfhRequest> for Request {
    fn from(value: WfhRequest) -> Self {
        Request::Wfh(value)
    }
}
