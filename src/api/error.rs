use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::{Value, json};

use crate::engine::error::EngineError;

impl EngineError {
    /// Variant payload for API clients, beyond the message.
    fn details(&self) -> Option<Value> {
        match self {
            EngineError::IneligibleCategory(category) => Some(json!({ "category": category })),
            EngineError::QuotaExceeded(remaining) | EngineError::MonthlyCapacityExceeded(remaining) => {
                Some(json!({ "remaining": remaining }))
            }
            EngineError::DateRangeConflict(id) => Some(json!({ "conflicting_request_id": id })),
            EngineError::DailyCapacityFull { date, cap } => Some(json!({ "date": date, "cap": cap })),
            EngineError::InvalidStateTransition { id, status } => Some(json!({ "request_id": id, "status": status })),
            EngineError::NotFound(id) => Some(json!({ "request_id": id })),
            EngineError::UnknownEmployee(id) => Some(json!({ "employee_id": id })),
            _ => None,
        }
    }
}

impl ResponseError for EngineError {
    fn status_code(&self) -> StatusCode {
        match self {
            EngineError::Validation(_) | EngineError::MissingRejectionReason => StatusCode::BAD_REQUEST,
            EngineError::IneligibleCategory(_)
            | EngineError::IneligibleForWfh
            | EngineError::QuotaExceeded(_)
            | EngineError::DailyCapacityFull { .. }
            | EngineError::MonthlyCapacityExceeded(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::DateRangeConflict(_)
            | EngineError::InvalidStateTransition { .. }
            | EngineError::ReportAlreadySubmitted
            | EngineError::ConcurrentModification => StatusCode::CONFLICT,
            EngineError::NotFound(_) | EngineError::UnknownEmployee(_) => StatusCode::NOT_FOUND,
            EngineError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let EngineError::Storage(detail) = self {
            tracing::error!(error = %detail, "request failed on storage");
            return HttpResponse::InternalServerError().json(json!({
                "error": self.code(),
                "message": "Internal Server Error"
            }));
        }

        let mut body = json!({
            "error": self.code(),
            "message": self.to_string(),
        });
        if let Some(details) = self.details() {
            body["details"] = details;
        }
        if self.is_retryable() {
            body["retryable"] = json!(true);
        }
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use chrono::NaiveDate;

    async fn body_of(err: EngineError) -> (StatusCode, Value) {
        let resp = err.error_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn capacity_errors_carry_their_numbers() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let (status, body) = body_of(EngineError::DailyCapacityFull { date, cap: 3 }).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "daily_capacity_full");
        assert_eq!(body["details"], json!({ "date": "2025-03-10", "cap": 3 }));
        assert!(body.get("retryable").is_none());
    }

    #[actix_web::test]
    async fn concurrent_modification_is_a_retryable_conflict() {
        let (status, body) = body_of(EngineError::ConcurrentModification).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["retryable"], true);
    }

    #[actix_web::test]
    async fn storage_details_stay_in_the_log() {
        let (status, body) = body_of(EngineError::Storage("connection refused on 10.0.0.5".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal Server Error");
        assert!(!body.to_string().contains("10.0.0.5"));
    }
}
