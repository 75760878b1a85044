use crate::api::leave_request::CreateLeave;
use crate::api::requests::{ApproveBody, RejectBody};
use crate::api::wfh_request::{CreateWfh, WorkReportBody};
use crate::model::leave_request::{LeaveCategory, LeaveRequest};
use crate::model::request::{Decision, RequestStatus};
use crate::model::wfh_request::{WfhRequest, WorkReport};
use crate::utils::pagination::{LeavePage, WfhPage};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave & Remote-Work API",
        version = "1.0.0",
        description = r#"
## Leave & Remote-Work Request Engine

Employees file **leave** (sick, personal, annual, unpaid, other) and **remote-work (WFH)** days;
HR/Admin approve or reject them.

### 🔹 Rules enforced on submission
- **Quota** per leave category and year; pending requests count
- **Eligibility**: annual leave after 12 months, remote work after 3 months of tenure
- **No overlap** between one employee's active requests
- **Capacity**: at most N people remote per day, M remote days per employee per month

### 🔐 Security
All endpoints require a **JWT Bearer** access token issued by the auth service.
Only **Admin** or **HR** can decide requests or read other employees' data.

### 📦 Errors
Every refusal is JSON `{ "error": <code>, "message": ..., "details": ... }`.
`409 concurrent_modification` carries `"retryable": true`; retry the whole call.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave_request::create_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::entitlements,
        crate::api::leave_request::leave_summary,
        crate::api::leave_request::leave_daily,

        crate::api::wfh_request::create_wfh,
        crate::api::wfh_request::wfh_list,
        crate::api::wfh_request::occupancy,
        crate::api::wfh_request::usage,
        crate::api::wfh_request::work_reports,
        crate::api::wfh_request::submit_work_report,

        crate::api::requests::list_active,
        crate::api::requests::upcoming,
        crate::api::requests::get_request,
        crate::api::requests::approve,
        crate::api::requests::reject
    ),
    components(
        schemas(
            CreateLeave,
            CreateWfh,
            WorkReportBody,
            ApproveBody,
            RejectBody,
            LeaveRequest,
            LeaveCategory,
            WfhRequest,
            WorkReport,
            Decision,
            RequestStatus,
            LeavePage,
            WfhPage
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave requests, quotas and leave charts"),
        (name = "Remote work", description = "Remote-work days, capacity and work reports"),
        (name = "Requests", description = "Approval workflow across both kinds"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme the paths refer to.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
