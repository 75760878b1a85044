use crate::api::list_window;
use crate::auth::auth::AuthUser;
use crate::engine::LeaveEngine;
use crate::ledger::LedgerQuery;
use crate::model::leave_request::{LeaveCategory, LeaveRequest, NewLeave};
use crate::model::request::RequestStatus;
use crate::utils::pagination::{LeavePage, Page, PageParams};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    pub category: LeaveCategory, // enum ensures Swagger dropdown
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-07", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// Mandatory for personal_leave and other_leave
    #[schema(example = "Family matters")]
    pub reason: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaveFilter {
    /// Filter by employee ID (HR/Admin only; others always see their own)
    #[param(example = 1000)]
    pub employee_id: Option<u64>,
    /// Filter by request status
    pub status: Option<RequestStatus>,
    /// Filter by leave category
    pub category: Option<LeaveCategory>,
    /// Keep requests overlapping [from, to]
    #[param(value_type = Option<String>, example = "2026-01-01")]
    pub from: Option<NaiveDate>,
    #[param(value_type = Option<String>, example = "2026-01-31")]
    pub to: Option<NaiveDate>,
    /// Pagination page number (start with 1)
    #[param(example = 1)]
    pub page: Option<u64>,
    /// Items per page, at most 100
    #[param(example = 10)]
    pub per_page: Option<u64>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeeYearQuery {
    /// Employee to report on; defaults to the caller
    #[param(example = 1000)]
    pub employee_id: Option<u64>,
    /// Policy year; defaults to the current year
    #[param(example = 2026)]
    pub year: Option<i32>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateWindow {
    #[param(value_type = String, example = "2026-01-01")]
    pub from: NaiveDate,
    #[param(value_type = String, example = "2026-01-31")]
    pub to: NaiveDate,
}

/* =========================
Submit leave request
========================= */
/// Swagger doc for create_leave endpoint
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request filed as pending", body = LeaveRequest),
        (status = 400, description = "Malformed dates or missing reason", body = Object, example = json!({
            "error": "validation_error",
            "message": "invalid request: leave cannot start in the past"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile"),
        (status = 409, description = "Overlaps an active request", body = Object, example = json!({
            "error": "date_range_conflict",
            "message": "dates overlap active request 4f2b6a1e-8c1d-4a43-9a55-5d0f3c9e7b21",
            "details": { "conflicting_request_id": "4f2b6a1e-8c1d-4a43-9a55-5d0f3c9e7b21" }
        })),
        (status = 422, description = "Not eligible or quota exceeded", body = Object, example = json!({
            "error": "quota_exceeded",
            "message": "leave quota exceeded: 2 day(s) remaining",
            "details": { "remaining": 2 }
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.own_employee_id()?;
    let payload = payload.into_inner();

    let request = engine
        .submit_leave(NewLeave {
            employee_id,
            category: payload.category,
            start_date: payload.start_date,
            end_date: payload.end_date,
            reason: payload.reason,
        })
        .await?;

    Ok(HttpResponse::Created().json(request))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list, newest first", body = LeavePage),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    let employee_id = if auth.is_approver() {
        query.employee_id
    } else {
        Some(auth.resolve_employee(query.employee_id)?)
    };

    let filter = LedgerQuery {
        employee_id,
        statuses: query.status.into_iter().collect(),
        window: list_window(query.from, query.to)?,
        category: query.category,
    };
    let leaves = engine.list_leave(&filter).await?;

    let params = PageParams {
        page: query.page,
        per_page: query.per_page,
    };
    Ok(HttpResponse::Ok().json(Page::slice(leaves, &params)))
}

/// Used/remaining days of every category
#[utoipa::path(
    get,
    path = "/api/leave/entitlements",
    params(EmployeeYearQuery),
    responses(
        (status = 200, description = "One entry per leave category", body = Object, example = json!([
            {
                "category": "sick_leave",
                "year": 2026,
                "used": 28,
                "total": 30,
                "remaining": 2,
                "requestable": true
            },
            {
                "category": "unpaid_leave",
                "year": 2026,
                "used": 3,
                "total": "unlimited",
                "remaining": "unlimited",
                "requestable": true
            }
        ])),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Unknown employee")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn entitlements(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    query: web::Query<EmployeeYearQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.resolve_employee(query.employee_id)?;
    let year = query.year.unwrap_or_else(|| engine.current_year());

    let overview = engine.entitlements(employee_id, year).await?;
    Ok(HttpResponse::Ok().json(overview))
}

/// Request count and days per category for one employee and year
#[utoipa::path(
    get,
    path = "/api/leave/summary",
    params(EmployeeYearQuery),
    responses(
        (status = 200, description = "Active leave per category", body = Object, example = json!({
            "sick_leave": { "requests": 2, "days": 3 },
            "personal_leave": { "requests": 0, "days": 0 },
            "annual_leave": { "requests": 1, "days": 5 },
            "unpaid_leave": { "requests": 0, "days": 0 },
            "other_leave": { "requests": 0, "days": 0 }
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_summary(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    query: web::Query<EmployeeYearQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.resolve_employee(query.employee_id)?;
    let year = query.year.unwrap_or_else(|| engine.current_year());

    let summary = engine.leave_summary(employee_id, year).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// People on leave per day (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/leave/daily",
    params(DateWindow),
    responses(
        (status = 200, description = "Every day of the window", body = Object, example = json!({
            "2026-01-05": { "approved": 2, "pending": 1 },
            "2026-01-06": { "approved": 0, "pending": 0 }
        })),
        (status = 400, description = "Window reversed or longer than a year"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_daily(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    query: web::Query<DateWindow>,
) -> actix_web::Result<impl Responder> {
    auth.require_approver()?;

    let occupancy = engine.leave_occupancy(query.from, query.to).await?;
    Ok(HttpResponse::Ok().json(occupancy))
}
