use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::model::request::{Decision, EmployeeId, RequestStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WorkReport {
    #[schema(example = "Closed tickets #231 and #240")]
    pub text: String,
    #[schema(example = "2026-01-05T17:00:00Z", format = "date-time", value_type = String)]
    pub submitted_at: DateTime<Utc>,
}

/// One remote-work day. Ranges are expressed as one record per day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WfhRequest {
    #[schema(example = "0d3c1f7a-2b5e-4e8f-9a3b-6c1d2e4f5a6b", value_type = String)]
    pub id: Uuid,
    #[schema(example = 1000)]
    pub employee_id: EmployeeId,
    #[schema(example = "2026-01-01T08:00:00Z", format = "date-time", value_type = String)]
    pub requested_at: DateTime<Utc>,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub wfh_date: NaiveDate,
    pub status: RequestStatus,
    #[schema(nullable = true)]
    pub decision: Option<Decision>,
    #[schema(nullable = true)]
    pub work_report: Option<WorkReport>,
}

impl WfhRequest {
    pub fn pending(employee_id: EmployeeId, wfh_date: NaiveDate, requested_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            employee_id,
            requested_at,
            wfh_date,
            status: RequestStatus::Pending,
            decision: None,
            work_report: None,
        }
    }
}
