use chrono::NaiveDate;
use derive_more::Display;
use uuid::Uuid;

use crate::model::leave_request::LeaveCategory;
use crate::model::request::{EmployeeId, RequestStatus};

/// Every way an engine operation can fail.
///
/// All variants except `ConcurrentModification` and `Storage` are business
/// outcomes: retrying with the same input gives the same answer.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum EngineError {
    #[display(fmt = "invalid request: {}", _0)]
    Validation(String),

    #[display(fmt = "{} is not requestable for this employee yet", _0)]
    IneligibleCategory(LeaveCategory),

    #[display(fmt = "employee has not reached the tenure required for remote work")]
    IneligibleForWfh,

    #[display(fmt = "leave quota exceeded: {} day(s) remaining", _0)]
    QuotaExceeded(u32),

    #[display(fmt = "dates overlap active request {}", _0)]
    DateRangeConflict(Uuid),

    #[display(fmt = "remote-work capacity on {} is full ({} per day)", date, cap)]
    DailyCapacityFull { date: NaiveDate, cap: u32 },

    #[display(fmt = "monthly remote-work limit reached: {} day(s) remaining", _0)]
    MonthlyCapacityExceeded(u32),

    #[display(fmt = "request {} is {} and can no longer change", id, status)]
    InvalidStateTransition { id: Uuid, status: RequestStatus },

    #[display(fmt = "a note is required when rejecting a request")]
    MissingRejectionReason,

    #[display(fmt = "a work report was already submitted for this request")]
    ReportAlreadySubmitted,

    #[display(fmt = "request {} not found", _0)]
    NotFound(Uuid),

    #[display(fmt = "employee {} not found", _0)]
    UnknownEmployee(EmployeeId),

    #[display(fmt = "the ledger changed concurrently, retry the operation")]
    ConcurrentModification,

    #[display(fmt = "storage failure: {}", _0)]
    Storage(String),
}

impl std::error::Error for EngineError {}

impl EngineError {
    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "validation_error",
            EngineError::IneligibleCategory(_) => "ineligible_category",
            EngineError::IneligibleForWfh => "ineligible_for_wfh",
            EngineError::QuotaExceeded(_) => "quota_exceeded",
            EngineError::DateRangeConflict(_) => "date_range_conflict",
            EngineError::DailyCapacityFull { .. } => "daily_capacity_full",
            EngineError::MonthlyCapacityExceeded(_) => "monthly_capacity_exceeded",
            EngineError::InvalidStateTransition { .. } => "invalid_state_transition",
            EngineError::MissingRejectionReason => "missing_rejection_reason",
            EngineError::ReportAlreadySubmitted => "report_already_submitted",
            EngineError::NotFound(_) => "not_found",
            EngineError::UnknownEmployee(_) => "unknown_employee",
            EngineError::ConcurrentModification => "concurrent_modification",
            EngineError::Storage(_) => "storage_error",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::ConcurrentModification)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation(message.into())
    }
}
