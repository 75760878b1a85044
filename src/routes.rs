use crate::{
    api::{leave_request, requests, wfh_request},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{guard, middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let requests_per_min = requests_per_min.max(1);
        let per_ms = (60_000 / requests_per_min as u64).max(1);
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap_or_default();
        Governor::new(&cfg)
    }

    let submit_limiter = Arc::new(build_limiter(config.rate_submit_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/leave")
                    // POST /leave
                    .service(
                        web::resource("")
                            .guard(guard::Post())
                            .wrap(submit_limiter.clone())
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // GET /leave
                    .service(web::resource("").route(web::get().to(leave_request::leave_list)))
                    .service(
                        web::resource("/entitlements")
                            .route(web::get().to(leave_request::entitlements)),
                    )
                    .service(
                        web::resource("/summary").route(web::get().to(leave_request::leave_summary)),
                    )
                    .service(web::resource("/daily").route(web::get().to(leave_request::leave_daily))),
            )
            .service(
                web::scope("/wfh")
                    // POST /wfh
                    .service(
                        web::resource("")
                            .guard(guard::Post())
                            .wrap(submit_limiter.clone())
                            .route(web::post().to(wfh_request::create_wfh)),
                    )
                    // GET /wfh
                    .service(web::resource("").route(web::get().to(wfh_request::wfh_list)))
                    .service(web::resource("/occupancy").route(web::get().to(wfh_request::occupancy)))
                    .service(web::resource("/usage").route(web::get().to(wfh_request::usage)))
                    .service(
                        web::resource("/work-reports").route(web::get().to(wfh_request::work_reports)),
                    )
                    // /wfh/{id}/work-report
                    .service(
                        web::resource("/{id}/work-report")
                            .route(web::put().to(wfh_request::submit_work_report)),
                    ),
            )
            .service(
                web::scope("/requests")
                    // fixed paths before /{id}
                    .service(web::resource("/active").route(web::get().to(requests::list_active)))
                    .service(web::resource("/upcoming").route(web::get().to(requests::upcoming)))
                    .service(web::resource("/{id}").route(web::get().to(requests::get_request)))
                    .service(web::resource("/{id}/approve").route(web::put().to(requests::approve)))
                    .service(web::resource("/{id}/reject").route(web::put().to(requests::reject))),
            ),
    );
}

// SUBMIT
//  └─ POST /leave | POST /wfh            → pending
//
// DECIDE (HR/Admin)
//  ├─ PUT /requests/{id}/approve         → approved
//  └─ PUT /requests/{id}/reject + note   → rejected
//
// AFTER AN APPROVED REMOTE DAY
//  └─ PUT /wfh/{id}/work-report
