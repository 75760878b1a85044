use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::request::EmployeeId;

/// Read-only slice of the employee master record used by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1000,
        "full_name": "John Doe",
        "position": "IT Support",
        "hire_date": "2024-01-01"
    })
)]
pub struct EmployeeProfile {
    #[schema(example = 1000)]
    pub id: EmployeeId,

    #[schema(example = "John Doe")]
    pub full_name: String,

    /// job title; drives the monthly remote-work cap
    #[schema(example = "IT Support")]
    pub position: String,

    #[schema(
        example = "2024-01-01",
        value_type = String,
        format = "date"
    )]
    pub hire_date: NaiveDate,
}
