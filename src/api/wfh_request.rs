use crate::api::leave_request::DateWindow;
use crate::api::list_window;
use crate::auth::auth::AuthUser;
use crate::engine::LeaveEngine;
use crate::engine::calendar::YearMonth;
use crate::ledger::LedgerQuery;
use crate::model::request::RequestStatus;
use crate::model::wfh_request::WfhRequest;
use crate::utils::pagination::{Page, PageParams, WfhPage};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Deserialize, ToSchema)]
pub struct CreateWfh {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub wfh_date: NaiveDate,
}

#[derive(Deserialize, ToSchema)]
pub struct WorkReportBody {
    #[schema(example = "Closed tickets #231 and #240")]
    pub text: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WfhFilter {
    /// Filter by employee ID (HR/Admin only; others always see their own)
    #[param(example = 1000)]
    pub employee_id: Option<u64>,
    /// Filter by request status
    pub status: Option<RequestStatus>,
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
pub struct UsageQuery {
    /// Employee to report on; defaults to the caller
    #[param(example = 1000)]
    pub employee_id: Option<u64>,
    /// Calendar month as YYYY-MM; defaults to the current month
    #[param(value_type = Option<String>, example = "2026-01")]
    pub month: Option<YearMonth>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WorkReportQuery {
    #[param(value_type = String, example = "2026-01-01")]
    pub from: NaiveDate,
    #[param(value_type = String, example = "2026-01-31")]
    pub to: NaiveDate,
    /// HR/Admin may filter by employee or see everyone; others see their own
    #[param(example = 1000)]
    pub employee_id: Option<u64>,
}

/// Request one remote-work day
#[utoipa::path(
    post,
    path = "/api/wfh",
    request_body(
        content = CreateWfh,
        description = "Remote-work day",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Remote-work request filed as pending", body = WfhRequest),
        (status = 400, description = "Weekend or past date"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile"),
        (status = 409, description = "Overlaps an active request"),
        (status = 422, description = "Capacity or tenure rule refused it", body = Object, example = json!({
            "error": "daily_capacity_full",
            "message": "remote-work capacity on 2026-01-05 is full (3 per day)",
            "details": { "date": "2026-01-05", "cap": 3 }
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Remote work"
)]
pub async fn create_wfh(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    payload: web::Json<CreateWfh>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.own_employee_id()?;

    let request = engine.submit_wfh(employee_id, payload.wfh_date).await?;
    Ok(HttpResponse::Created().json(request))
}

#[utoipa::path(
    get,
    path = "/api/wfh",
    params(WfhFilter),
    responses(
        (status = 200, description = "Paginated remote-work list, newest first", body = WfhPage),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Remote work"
)]
pub async fn wfh_list(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    query: web::Query<WfhFilter>,
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
        category: None,
    };
    let requests = engine.list_wfh(&filter).await?;

    let params = PageParams {
        page: query.page,
        per_page: query.per_page,
    };
    Ok(HttpResponse::Ok().json(Page::slice(requests, &params)))
}

/// Remote-work occupancy per day, coloured against the daily cap
#[utoipa::path(
    get,
    path = "/api/wfh/occupancy",
    params(DateWindow),
    responses(
        (status = 200, description = "Every day of the window", body = Object, example = json!([
            { "date": "2026-01-05", "approved": 2, "pending": 1, "total": 3, "status": "full" },
            { "date": "2026-01-06", "approved": 1, "pending": 0, "total": 1, "status": "limited" },
            { "date": "2026-01-07", "approved": 0, "pending": 0, "total": 0, "status": "available" }
        ])),
        (status = 400, description = "Window reversed or longer than a year"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Remote work"
)]
pub async fn occupancy(
    _auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    query: web::Query<DateWindow>,
) -> actix_web::Result<impl Responder> {
    let calendar = engine.capacity_calendar(query.from, query.to).await?;
    Ok(HttpResponse::Ok().json(calendar))
}

/// Remote-work days held in one month against the employee's cap
#[utoipa::path(
    get,
    path = "/api/wfh/usage",
    params(UsageQuery),
    responses(
        (status = 200, description = "Monthly usage", body = Object, example = json!({
            "month": "2026-01",
            "used": 4,
            "cap": 6,
            "remaining": 2
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Unknown employee")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Remote work"
)]
pub async fn usage(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    query: web::Query<UsageQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.resolve_employee(query.employee_id)?;
    let month = query.month.unwrap_or_else(|| YearMonth::of(engine.today()));

    let usage = engine.monthly_usage(employee_id, month).await?;
    Ok(HttpResponse::Ok().json(usage))
}

/// Approved remote-work days whose report is submitted, due or overdue
#[utoipa::path(
    get,
    path = "/api/wfh/work-reports",
    params(WorkReportQuery),
    responses(
        (status = 200, description = "Reports bucketed by state", body = Object, example = json!({
            "submitted": [],
            "due_soon": [
                { "request": { "id": "0d3c1f7a-2b5e-4e8f-9a3b-6c1d2e4f5a6b", "employee_id": 1000, "wfh_date": "2026-01-05", "status": "approved" }, "days_overdue": 1 }
            ],
            "overdue": []
        })),
        (status = 400, description = "Window reversed or longer than a year"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Remote work"
)]
pub async fn work_reports(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    query: web::Query<WorkReportQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = if auth.is_approver() {
        query.employee_id
    } else {
        Some(auth.resolve_employee(query.employee_id)?)
    };

    let buckets = engine.work_reports(query.from, query.to, employee_id).await?;
    Ok(HttpResponse::Ok().json(buckets))
}

/// Attach the work report to one's own approved remote-work day
#[utoipa::path(
    put,
    path = "/api/wfh/{id}/work-report",
    params(
        ("id" = String, Path, description = "ID of the remote-work request")
    ),
    request_body(
        content = WorkReportBody,
        description = "What was done that day",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Report stored", body = WfhRequest),
        (status = 400, description = "Empty report or the day has not arrived"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your request"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Not approved, or a report already exists", body = Object, example = json!({
            "error": "report_already_submitted",
            "message": "a work report was already submitted for this request"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Remote work"
)]
pub async fn submit_work_report(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    path: web::Path<Uuid>,
    payload: web::Json<WorkReportBody>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();

    let owner = engine.get_request(id).await?.employee_id();
    if auth.employee_id != Some(owner) {
        return Err(actix_web::error::ErrorForbidden("Not your request"));
    }

    let request = engine.submit_work_report(id, &payload.text).await?;
    Ok(HttpResponse::Ok().json(request))
}
