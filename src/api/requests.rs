use crate::auth::auth::AuthUser;
use crate::engine::LeaveEngine;
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Deserialize, ToSchema)]
pub struct ApproveBody {
    #[schema(example = "Enjoy your break")]
    pub note: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct RejectBody {
    /// Mandatory reason shown to the employee
    #[serde(default)]
    #[schema(example = "Team offsite that week")]
    pub note: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeeQuery {
    /// Employee to list; defaults to the caller
    #[param(example = 1000)]
    pub employee_id: Option<u64>,
}

/// Pending and approved requests of both kinds, by start date
#[utoipa::path(
    get,
    path = "/api/requests/active",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Active requests; `kind` tells leave from remote work", body = Object, example = json!([
            {
                "kind": "leave",
                "id": "4f2b6a1e-8c1d-4a43-9a55-5d0f3c9e7b21",
                "employee_id": 1000,
                "start_date": "2026-01-05",
                "end_date": "2026-01-07",
                "category": "annual_leave",
                "leave_days": 3,
                "status": "approved"
            },
            {
                "kind": "wfh",
                "id": "0d3c1f7a-2b5e-4e8f-9a3b-6c1d2e4f5a6b",
                "employee_id": 1000,
                "wfh_date": "2026-01-09",
                "status": "pending"
            }
        ])),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn list_active(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.resolve_employee(query.employee_id)?;

    let active = engine.list_active(employee_id).await?;
    Ok(HttpResponse::Ok().json(active))
}

/// Approved leave and remote work starting in the next few days (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/requests/upcoming",
    responses(
        (status = 200, description = "Earliest first", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn upcoming(auth: AuthUser, engine: web::Data<LeaveEngine>) -> actix_web::Result<impl Responder> {
    auth.require_approver()?;

    let upcoming = engine.upcoming().await?;
    Ok(HttpResponse::Ok().json(upcoming))
}

/// for getting one request of either kind
#[utoipa::path(
    get,
    path = "/api/requests/{id}",
    params(
        ("id" = String, Path, description = "ID of the leave or remote-work request")
    ),
    responses(
        (status = 200, description = "Request found", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your request"),
        (status = 404, description = "Request not found", body = Object, example = json!({
            "error": "not_found",
            "message": "request 4f2b6a1e-8c1d-4a43-9a55-5d0f3c9e7b21 not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn get_request(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    path: web::Path<Uuid>,
) -> actix_web::Result<impl Responder> {
    let request = engine.get_request(path.into_inner()).await?;
    auth.may_read(request.employee_id())?;

    Ok(HttpResponse::Ok().json(request))
}

/* =========================
Approve request (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/requests/{id}/approve",
    params(
        ("id" = String, Path, description = "ID of the pending request to approve")
    ),
    request_body(
        content = ApproveBody,
        description = "Optional note",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Request approved", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request already decided", body = Object, example = json!({
            "error": "invalid_state_transition",
            "message": "request 4f2b6a1e-8c1d-4a43-9a55-5d0f3c9e7b21 is approved and can no longer change",
            "details": { "request_id": "4f2b6a1e-8c1d-4a43-9a55-5d0f3c9e7b21", "status": "approved" }
        })),
        (status = 422, description = "Approving would now exceed capacity or quota")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn approve(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    path: web::Path<Uuid>,
    payload: Option<web::Json<ApproveBody>>,
) -> actix_web::Result<impl Responder> {
    auth.require_approver()?;

    let note = payload.and_then(|p| p.into_inner().note);
    let request = engine.approve(path.into_inner(), auth.user_id, note).await?;
    Ok(HttpResponse::Ok().json(request))
}

/* =========================
Reject request (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/requests/{id}/reject",
    params(
        ("id" = String, Path, description = "ID of the pending request to reject")
    ),
    request_body(
        content = RejectBody,
        description = "Mandatory reason",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Request rejected", body = Object),
        (status = 400, description = "Missing reason", body = Object, example = json!({
            "error": "missing_rejection_reason",
            "message": "a note is required when rejecting a request"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request already decided")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn reject(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    path: web::Path<Uuid>,
    payload: Option<web::Json<RejectBody>>,
) -> actix_web::Result<impl Responder> {
    auth.require_approver()?;

    // a missing body or note is refused by the engine with its own code
    let note = payload.map(|p| p.into_inner().note).unwrap_or_default();
    let request = engine.reject(path.into_inner(), auth.user_id, &note).await?;
    Ok(HttpResponse::Ok().json(request))
}
