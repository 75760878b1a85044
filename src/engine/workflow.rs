use chrono::{Datelike, NaiveDate};
use tracing::{debug, info};
use uuid::Uuid;

use super::LeaveEngine;
use crate::engine::calendar::{self, DateRange, YearMonth};
use crate::engine::capacity;
use crate::engine::conflict;
use crate::engine::error::EngineError;
use crate::engine::policy::Eligibility;
use crate::engine::quota;
use crate::ledger::{LedgerQuery, LedgerTx, LockKey, LockScope};
use crate::model::leave_request::{LeaveRequest, NewLeave};
use crate::model::request::{Decision, EmployeeId, Request, RequestStatus, UserId};
use crate::model::wfh_request::{WfhRequest, WorkReport};

fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

fn refused(action: &'static str) -> impl Fn(&EngineError) {
    move |e| debug!(action, code = e.code(), error = %e, "request refused")
}

impl LeaveEngine {
    /// Files a leave request in Pending state. Nothing is written unless every check passes.
    pub async fn submit_leave(&self, new: NewLeave) -> Result<LeaveRequest, EngineError> {
        self.try_submit_leave(new).await.inspect_err(refused("submit_leave"))
    }

    async fn try_submit_leave(&self, mut new: NewLeave) -> Result<LeaveRequest, EngineError> {
        let today = self.clock.today();
        let range = DateRange::new(new.start_date, new.end_date)?;
        if range.start() < today {
            return Err(EngineError::validation("leave cannot start in the past"));
        }

        let rule = *self.policy.entitlements.rule(new.category);
        new.reason = non_blank(new.reason);
        if rule.requires_reason && new.reason.is_none() {
            return Err(EngineError::validation(format!("a reason is required for {}", new.category)));
        }

        let leave_days = calendar::working_days_excluding(range.start(), range.end(), &self.policy.holidays);
        if leave_days == 0 {
            return Err(EngineError::validation("the requested range contains no working days"));
        }

        if !matches!(rule.eligibility, Eligibility::Always)
            && !self.is_eligible(new.employee_id, rule.eligibility).await?
        {
            return Err(EngineError::IneligibleCategory(new.category));
        }

        let mut tx = self.ledger.begin(LockScope::employee(new.employee_id)).await?;

        let booked = tx
            .leave_requests(&LedgerQuery::active().for_employee(new.employee_id).with_category(new.category))
            .await?;
        let entitlement = quota::evaluate(
            &self.policy.entitlements,
            new.category,
            range.start().year(),
            &booked,
            true,
        );
        quota::ensure_fits(&entitlement, leave_days)?;

        ensure_dates_free(tx.as_mut(), new.employee_id, range).await?;

        let request = LeaveRequest::pending(new, leave_days, self.clock.now());
        tx.insert_leave(&request).await?;
        tx.commit().await?;

        info!(
            request_id = %request.id,
            employee_id = request.employee_id,
            category = %request.category,
            leave_days = request.leave_days,
            "leave request submitted"
        );
        Ok(request)
    }

    /// Files a remote-work day in Pending state, reserving one slot of the daily
    /// and of the employee's monthly capacity.
    pub async fn submit_wfh(&self, employee_id: EmployeeId, wfh_date: NaiveDate) -> Result<WfhRequest, EngineError> {
        self.try_submit_wfh(employee_id, wfh_date)
            .await
            .inspect_err(refused("submit_wfh"))
    }

    async fn try_submit_wfh(&self, employee_id: EmployeeId, wfh_date: NaiveDate) -> Result<WfhRequest, EngineError> {
        let today = self.clock.today();
        if !calendar::is_working_day(wfh_date) {
            return Err(EngineError::validation(format!("{} is not a weekday", wfh_date)));
        }
        if wfh_date < today {
            return Err(EngineError::validation("remote work cannot be requested for a past date"));
        }

        let profile = self.profile(employee_id).await?;
        if !self.policy.capacity.wfh_eligibility().is_met(profile.hire_date, today) {
            return Err(EngineError::IneligibleForWfh);
        }
        let monthly_cap = self.policy.capacity.monthly_cap_for(&profile.position);

        let mut tx = self
            .ledger
            .begin(LockScope::employee(employee_id).with_date(wfh_date))
            .await?;

        let on_date = tx
            .wfh_requests(&LedgerQuery::active().within(DateRange::single(wfh_date)))
            .await?;
        capacity::ensure_daily_capacity(&on_date, wfh_date, self.policy.capacity.daily_cap)?;

        let month = YearMonth::of(wfh_date);
        let mine = tx
            .wfh_requests(&LedgerQuery::active().for_employee(employee_id).within(month.range()))
            .await?;
        capacity::ensure_monthly_capacity(&capacity::monthly_usage(&mine, employee_id, month, monthly_cap))?;

        ensure_dates_free(tx.as_mut(), employee_id, DateRange::single(wfh_date)).await?;

        let request = WfhRequest::pending(employee_id, wfh_date, self.clock.now());
        tx.insert_wfh(&request).await?;
        tx.commit().await?;

        info!(
            request_id = %request.id,
            employee_id,
            wfh_date = %wfh_date,
            "remote work request submitted"
        );
        Ok(request)
    }

    pub async fn approve(&self, id: Uuid, approver_id: UserId, note: Option<String>) -> Result<Request, EngineError> {
        self.decide(id, approver_id, RequestStatus::Approved, non_blank(note))
            .await
            .inspect_err(refused("approve"))
    }

    /// Rejection always carries the approver's reason.
    pub async fn reject(&self, id: Uuid, approver_id: UserId, note: &str) -> Result<Request, EngineError> {
        let note = non_blank(Some(note.to_string()));
        if note.is_none() {
            debug!(request_id = %id, "rejection without a reason");
            return Err(EngineError::MissingRejectionReason);
        }
        self.decide(id, approver_id, RequestStatus::Rejected, note)
            .await
            .inspect_err(refused("reject"))
    }

    async fn decide(
        &self,
        id: Uuid,
        approver_id: UserId,
        status: RequestStatus,
        note: Option<String>,
    ) -> Result<Request, EngineError> {
        // owner and dates never change, so the scope can come from an unlocked read
        let seen = self.get_request(id).await?;
        let (start, end) = seen.span();
        let mut scope = LockScope::employee(seen.employee_id()).with(LockKey::Request(id));
        if start == end {
            scope = scope.with_date(start);
        }

        let mut tx = self.ledger.begin(scope).await?;
        let current = tx.find(id).await?.ok_or(EngineError::NotFound(id))?;
        if current.status() != RequestStatus::Pending {
            return Err(EngineError::InvalidStateTransition {
                id,
                status: current.status(),
            });
        }

        if status == RequestStatus::Approved && self.policy.revalidate_on_approval {
            self.revalidate(tx.as_mut(), &current).await?;
        }

        let decision = Decision {
            approver_id,
            decided_at: self.clock.now(),
            note,
        };
        if !tx.decide(id, status, &decision).await? {
            let status = tx.find(id).await?.map(|r| r.status()).unwrap_or(status);
            return Err(EngineError::InvalidStateTransition { id, status });
        }
        let updated = tx.find(id).await?.ok_or(EngineError::NotFound(id))?;
        tx.commit().await?;

        info!(
            request_id = %id,
            employee_id = updated.employee_id(),
            approver_id,
            status = %status,
            "request decided"
        );
        Ok(updated)
    }

    /// Re-runs the capacity or quota check for `request` as if it were being
    /// submitted now, not counting the request itself.
    async fn revalidate(&self, tx: &mut dyn LedgerTx, request: &Request) -> Result<(), EngineError> {
        match request {
            Request::Wfh(wfh) => {
                let others: Vec<WfhRequest> = tx
                    .wfh_requests(&LedgerQuery::active().within(DateRange::single(wfh.wfh_date)))
                    .await?
                    .into_iter()
                    .filter(|r| r.id != wfh.id)
                    .collect();
                capacity::ensure_daily_capacity(&others, wfh.wfh_date, self.policy.capacity.daily_cap)?;

                let monthly_cap = match self.directory.get_employee(wfh.employee_id).await? {
                    Some(profile) => self.policy.capacity.monthly_cap_for(&profile.position),
                    None => self.policy.capacity.monthly_cap,
                };
                let month = YearMonth::of(wfh.wfh_date);
                let mine: Vec<WfhRequest> = tx
                    .wfh_requests(&LedgerQuery::active().for_employee(wfh.employee_id).within(month.range()))
                    .await?
                    .into_iter()
                    .filter(|r| r.id != wfh.id)
                    .collect();
                capacity::ensure_monthly_capacity(&capacity::monthly_usage(
                    &mine,
                    wfh.employee_id,
                    month,
                    monthly_cap,
                ))
            }
            Request::Leave(leave) => {
                let others: Vec<LeaveRequest> = tx
                    .leave_requests(&LedgerQuery::active().for_employee(leave.employee_id).with_category(leave.category))
                    .await?
                    .into_iter()
                    .filter(|r| r.id != leave.id)
                    .collect();
                let entitlement = quota::evaluate(
                    &self.policy.entitlements,
                    leave.category,
                    leave.start_date.year(),
                    &others,
                    true,
                );
                quota::ensure_fits(&entitlement, leave.leave_days)
            }
        }
    }

    /// Attaches the report for an Approved WFH day that has arrived. Once only.
    pub async fn submit_work_report(&self, id: Uuid, text: &str) -> Result<WfhRequest, EngineError> {
        self.try_submit_work_report(id, text)
            .await
            .inspect_err(refused("submit_work_report"))
    }

    async fn try_submit_work_report(&self, id: Uuid, text: &str) -> Result<WfhRequest, EngineError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EngineError::validation("work report text is empty"));
        }

        let seen = expect_wfh(self.get_request(id).await?)?;
        let mut tx = self
            .ledger
            .begin(
                LockScope::employee(seen.employee_id)
                    .with_date(seen.wfh_date)
                    .with(LockKey::Request(id)),
            )
            .await?;

        let current = expect_wfh(tx.find(id).await?.ok_or(EngineError::NotFound(id))?)?;
        if current.status != RequestStatus::Approved {
            return Err(EngineError::InvalidStateTransition {
                id,
                status: current.status,
            });
        }
        if current.wfh_date > self.clock.today() {
            return Err(EngineError::validation(format!(
                "the work report can be submitted from {} on",
                current.wfh_date
            )));
        }
        if current.work_report.is_some() {
            return Err(EngineError::ReportAlreadySubmitted);
        }

        let report = WorkReport {
            text: text.to_string(),
            submitted_at: self.clock.now(),
        };
        if !tx.attach_work_report(id, &report).await? {
            return Err(EngineError::ReportAlreadySubmitted);
        }
        let updated = expect_wfh(tx.find(id).await?.ok_or(EngineError::NotFound(id))?)?;
        tx.commit().await?;

        info!(request_id = %id, employee_id = updated.employee_id, "work report submitted");
        Ok(updated)
    }
}

fn expect_wfh(request: Request) -> Result<WfhRequest, EngineError> {
    match request {
        Request::Wfh(wfh) => Ok(wfh),
        Request::Leave(leave) => Err(EngineError::validation(format!(
            "request {} is a leave request; work reports belong to remote-work days",
            leave.id
        ))),
    }
}

/// Fails with the first active request of the employee, of either kind, overlapping `range`.
async fn ensure_dates_free(tx: &mut dyn LedgerTx, employee_id: EmployeeId, range: DateRange) -> Result<(), EngineError> {
    let query = LedgerQuery::active().for_employee(employee_id).within(range);
    let mut existing: Vec<Request> = tx
        .leave_requests(&query)
        .await?
        .into_iter()
        .map(Request::from)
        .collect();
    existing.extend(tx.wfh_requests(&query).await?.into_iter().map(Request::from));
    conflict::ensure_no_conflict(range.start(), range.end(), &existing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::StaticDirectory;
    use crate::engine::clock::{Clock, FixedClock};
    use crate::engine::policy::{EnginePolicy, Quota};
    use crate::ledger::Ledger;
    use crate::ledger::memory::MemoryLedger;
    use crate::model::employee::EmployeeProfile;
    use crate::model::leave_request::LeaveCategory;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;
    use std::time::Duration;

    // Monday
    fn today() -> NaiveDate {
        d(3, 3)
    }

    fn d(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).unwrap()
    }

    fn employee(id: EmployeeId, position: &str, hire_date: NaiveDate) -> EmployeeProfile {
        EmployeeProfile {
            id,
            full_name: format!("Employee {}", id),
            position: position.to_string(),
            hire_date,
        }
    }

    struct Fixture {
        engine: LeaveEngine,
        ledger: Arc<MemoryLedger>,
        clock: Arc<FixedClock>,
    }

    /// Employees 1-12 are long-tenured accountants, 20 a new hire (6 months),
    /// 21 a fresh hire (1 month), 30 an IT specialist.
    fn fixture_with(policy: EnginePolicy) -> Fixture {
        let mut staff: Vec<EmployeeProfile> = (1..=12).map(|id| employee(id, "Accountant", d(1, 2).with_year(2023).unwrap())).collect();
        staff.push(employee(20, "Accountant", NaiveDate::from_ymd_opt(2024, 9, 3).unwrap()));
        staff.push(employee(21, "Accountant", d(2, 1)));
        staff.push(employee(30, "IT Support", NaiveDate::from_ymd_opt(2022, 5, 1).unwrap()));

        let ledger = Arc::new(MemoryLedger::new(Duration::from_secs(5)));
        let clock = Arc::new(FixedClock::on(today()));
        let engine = LeaveEngine::new(
            ledger.clone(),
            Arc::new(StaticDirectory::new(staff)),
            policy,
            clock.clone(),
        );
        Fixture { engine, ledger, clock }
    }

    fn fixture() -> Fixture {
        fixture_with(EnginePolicy::default())
    }

    fn new_leave(employee_id: EmployeeId, category: LeaveCategory, start: NaiveDate, end: NaiveDate) -> NewLeave {
        NewLeave {
            employee_id,
            category,
            start_date: start,
            end_date: end,
            reason: Some("family matters".to_string()),
        }
    }

    /// Writes a ledger entry directly, bypassing submission rules.
    async fn seed_leave(ledger: &MemoryLedger, employee_id: EmployeeId, category: LeaveCategory, start: NaiveDate, end: NaiveDate, days: u32, status: RequestStatus) -> LeaveRequest {
        let request = LeaveRequest {
            id: Uuid::new_v4(),
            employee_id,
            requested_at: Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap(),
            start_date: start,
            end_date: end,
            category,
            leave_days: days,
            reason: None,
            status,
            decision: None,
        };
        let mut tx = ledger.begin(LockScope::employee(employee_id)).await.unwrap();
        tx.insert_leave(&request).await.unwrap();
        tx.commit().await.unwrap();
        request
    }

    #[actix_web::test]
    async fn sick_leave_quota_counts_remaining_days() {
        let f = fixture();
        seed_leave(&f.ledger, 1, LeaveCategory::SickLeave, d(1, 6), d(2, 12), 28, RequestStatus::Approved).await;

        let err = f
            .engine
            .submit_leave(new_leave(1, LeaveCategory::SickLeave, d(3, 10), d(3, 12)))
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::QuotaExceeded(2));

        let accepted = f
            .engine
            .submit_leave(new_leave(1, LeaveCategory::SickLeave, d(3, 10), d(3, 11)))
            .await
            .unwrap();
        assert_eq!(accepted.leave_days, 2);
        assert_eq!(accepted.status, RequestStatus::Pending);

        let entitlement = f.engine.get_entitlement(1, LeaveCategory::SickLeave, 2025).await.unwrap();
        assert_eq!(entitlement.used, 30);
        assert_eq!(entitlement.total, Quota::Limited(30));
        assert_eq!(entitlement.remaining, Quota::Limited(0));
    }

    #[actix_web::test]
    async fn fourth_wfh_on_a_full_day_is_refused() {
        let f = fixture();
        for employee_id in 1..=3 {
            f.engine.submit_wfh(employee_id, d(3, 10)).await.unwrap();
        }
        let err = f.engine.submit_wfh(4, d(3, 10)).await.unwrap_err();
        assert_eq!(err, EngineError::DailyCapacityFull { date: d(3, 10), cap: 3 });

        let occupancy = f.engine.daily_occupancy(d(3, 10), d(3, 10)).await.unwrap();
        assert_eq!(occupancy[&d(3, 10)].total(), 3);
    }

    #[actix_web::test]
    async fn overlapping_annual_leave_conflicts_with_approved_one() {
        let f = fixture();
        let first = f
            .engine
            .submit_leave(new_leave(1, LeaveCategory::AnnualLeave, d(3, 10), d(3, 12)))
            .await
            .unwrap();
        assert_eq!(first.leave_days, 3);
        f.engine.approve(first.id, 99, None).await.unwrap();

        let err = f
            .engine
            .submit_leave(new_leave(1, LeaveCategory::AnnualLeave, d(3, 12), d(3, 14)))
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::DateRangeConflict(first.id));
    }

    #[actix_web::test]
    async fn annual_leave_needs_a_year_of_tenure() {
        let f = fixture();
        let err = f
            .engine
            .submit_leave(new_leave(20, LeaveCategory::AnnualLeave, d(3, 10), d(3, 10)))
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::IneligibleCategory(LeaveCategory::AnnualLeave));

        let overview = f.engine.entitlements(20, 2025).await.unwrap();
        let annual = overview.iter().find(|e| e.category == LeaveCategory::AnnualLeave).unwrap();
        assert!(!annual.requestable);
        assert!(overview.iter().filter(|e| e.category != LeaveCategory::AnnualLeave).all(|e| e.requestable));
    }

    #[actix_web::test]
    async fn submissions_are_structurally_validated() {
        let f = fixture();
        let cases = [
            // starts in the past
            new_leave(1, LeaveCategory::SickLeave, d(2, 28), d(3, 4)),
            // end before start
            new_leave(1, LeaveCategory::SickLeave, d(3, 12), d(3, 10)),
            // weekend only
            new_leave(1, LeaveCategory::SickLeave, d(3, 8), d(3, 9)),
            NewLeave {
                reason: Some("   ".to_string()),
                ..new_leave(1, LeaveCategory::PersonalLeave, d(3, 10), d(3, 10))
            },
        ];
        for case in cases {
            let err = f.engine.submit_leave(case).await.unwrap_err();
            assert!(matches!(err, EngineError::Validation(_)), "{:?}", err);
        }

        assert!(matches!(f.engine.submit_wfh(1, d(3, 8)).await, Err(EngineError::Validation(_))));
        assert!(matches!(f.engine.submit_wfh(1, d(2, 28)).await, Err(EngineError::Validation(_))));
        assert!(f.ledger.leave_requests(&LedgerQuery::all()).await.unwrap().is_empty());
        assert!(f.ledger.wfh_requests(&LedgerQuery::all()).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn unpaid_leave_needs_no_reason_and_skips_holidays() {
        let mut policy = EnginePolicy::default();
        policy.holidays.insert(d(3, 11));
        let f = fixture_with(policy);
        let request = f
            .engine
            .submit_leave(NewLeave {
                reason: None,
                ..new_leave(1, LeaveCategory::UnpaidLeave, d(3, 10), d(3, 12))
            })
            .await
            .unwrap();
        assert_eq!(request.leave_days, 2);
        assert_eq!(request.reason, None);
    }

    #[actix_web::test]
    async fn no_two_active_requests_of_an_employee_overlap() {
        let f = fixture();
        let leave = f
            .engine
            .submit_leave(new_leave(1, LeaveCategory::SickLeave, d(3, 10), d(3, 12)))
            .await
            .unwrap();
        assert_eq!(
            f.engine.submit_wfh(1, d(3, 11)).await.unwrap_err(),
            EngineError::DateRangeConflict(leave.id)
        );

        let wfh = f.engine.submit_wfh(1, d(3, 13)).await.unwrap();
        assert_eq!(
            f.engine
                .submit_leave(new_leave(1, LeaveCategory::UnpaidLeave, d(3, 13), d(3, 14)))
                .await
                .unwrap_err(),
            EngineError::DateRangeConflict(wfh.id)
        );
        assert_eq!(
            f.engine.submit_wfh(1, d(3, 13)).await.unwrap_err(),
            EngineError::DateRangeConflict(wfh.id)
        );

        // another employee is unaffected
        f.engine.submit_wfh(2, d(3, 11)).await.unwrap();
    }

    #[actix_web::test]
    async fn rejected_requests_never_block_resubmission() {
        let f = fixture();
        let wfh = f.engine.submit_wfh(1, d(3, 10)).await.unwrap();
        f.engine.reject(wfh.id, 99, "team offsite").await.unwrap();
        let again = f.engine.submit_wfh(1, d(3, 10)).await.unwrap();
        assert_ne!(again.id, wfh.id);

        let leave = f
            .engine
            .submit_leave(new_leave(1, LeaveCategory::SickLeave, d(3, 11), d(3, 12)))
            .await
            .unwrap();
        f.engine.reject(leave.id, 99, "use annual leave").await.unwrap();
        f.engine
            .submit_leave(new_leave(1, LeaveCategory::SickLeave, d(3, 11), d(3, 12)))
            .await
            .unwrap();

        let active = f.engine.list_active(1).await.unwrap();
        assert_eq!(active.len(), 2);
        assert!(active.iter().all(|r| r.status() == RequestStatus::Pending));
    }

    #[actix_web::test]
    async fn decided_requests_are_final() {
        let f = fixture();
        let wfh = f.engine.submit_wfh(1, d(3, 10)).await.unwrap();
        let approved = f.engine.approve(wfh.id, 99, Some("ok".to_string())).await.unwrap();
        assert_eq!(approved.status(), RequestStatus::Approved);
        let Request::Wfh(approved) = approved else {
            panic!("expected a remote-work request");
        };
        let decision = approved.decision.clone().unwrap();
        assert_eq!(decision.approver_id, 99);
        assert_eq!(decision.note.as_deref(), Some("ok"));
        assert_eq!(decision.decided_at, f.clock.now());

        let expected = EngineError::InvalidStateTransition {
            id: wfh.id,
            status: RequestStatus::Approved,
        };
        assert_eq!(f.engine.approve(wfh.id, 98, None).await.unwrap_err(), expected);
        assert_eq!(f.engine.reject(wfh.id, 98, "changed my mind").await.unwrap_err(), expected);
        assert_eq!(f.engine.get_request(wfh.id).await.unwrap(), Request::Wfh(approved));

        let missing = Uuid::new_v4();
        assert_eq!(f.engine.approve(missing, 99, None).await.unwrap_err(), EngineError::NotFound(missing));
    }

    #[actix_web::test]
    async fn rejection_requires_a_reason() {
        let f = fixture();
        let wfh = f.engine.submit_wfh(1, d(3, 10)).await.unwrap();
        for note in ["", "   "] {
            assert_eq!(
                f.engine.reject(wfh.id, 99, note).await.unwrap_err(),
                EngineError::MissingRejectionReason
            );
        }
        assert_eq!(f.engine.get_request(wfh.id).await.unwrap().status(), RequestStatus::Pending);

        let rejected = f.engine.reject(wfh.id, 99, " no cover that day ").await.unwrap();
        let Request::Wfh(rejected) = rejected else {
            panic!("expected a remote-work request");
        };
        assert_eq!(rejected.status, RequestStatus::Rejected);
        assert_eq!(rejected.decision.unwrap().note.as_deref(), Some("no cover that day"));
    }

    #[actix_web::test]
    async fn wfh_needs_tenure_and_a_known_employee() {
        let f = fixture();
        assert_eq!(f.engine.submit_wfh(21, d(3, 10)).await.unwrap_err(), EngineError::IneligibleForWfh);
        assert_eq!(f.engine.submit_wfh(404, d(3, 10)).await.unwrap_err(), EngineError::UnknownEmployee(404));
        // six months is enough for remote work
        f.engine.submit_wfh(20, d(3, 10)).await.unwrap();
    }

    #[actix_web::test]
    async fn monthly_cap_depends_on_position() {
        let f = fixture();
        let march = [d(3, 3), d(3, 4), d(3, 5), d(3, 6), d(3, 7), d(3, 10)];
        for date in march {
            f.engine.submit_wfh(1, date).await.unwrap();
            f.engine.submit_wfh(30, date).await.unwrap();
        }
        assert_eq!(
            f.engine.submit_wfh(1, d(3, 11)).await.unwrap_err(),
            EngineError::MonthlyCapacityExceeded(0)
        );
        f.engine.submit_wfh(30, d(3, 11)).await.unwrap();
        // a new month starts fresh
        f.engine.submit_wfh(1, d(4, 1)).await.unwrap();

        let usage = f.engine.monthly_usage(30, YearMonth::new(2025, 3).unwrap()).await.unwrap();
        assert_eq!((usage.used, usage.cap, usage.remaining), (7, 16, 9));
        let usage = f.engine.monthly_usage(1, YearMonth::new(2025, 3).unwrap()).await.unwrap();
        assert_eq!((usage.used, usage.cap, usage.remaining), (6, 6, 0));
    }

    #[actix_web::test]
    async fn work_report_follows_approval_and_date() {
        let f = fixture();
        let wfh = f.engine.submit_wfh(1, d(3, 4)).await.unwrap();
        assert_eq!(
            f.engine.submit_work_report(wfh.id, "done").await.unwrap_err(),
            EngineError::InvalidStateTransition {
                id: wfh.id,
                status: RequestStatus::Pending
            }
        );
        f.engine.approve(wfh.id, 99, None).await.unwrap();
        assert!(matches!(
            f.engine.submit_work_report(wfh.id, "done").await,
            Err(EngineError::Validation(_))
        ));

        f.clock.advance_days(1);
        assert!(matches!(
            f.engine.submit_work_report(wfh.id, "  ").await,
            Err(EngineError::Validation(_))
        ));
        let reported = f.engine.submit_work_report(wfh.id, "Closed tickets #231 and #240").await.unwrap();
        let report = reported.work_report.unwrap();
        assert_eq!(report.text, "Closed tickets #231 and #240");
        assert_eq!(report.submitted_at, f.clock.now());
        assert_eq!(
            f.engine.submit_work_report(wfh.id, "again").await.unwrap_err(),
            EngineError::ReportAlreadySubmitted
        );

        let leave = f
            .engine
            .submit_leave(new_leave(2, LeaveCategory::SickLeave, d(3, 4), d(3, 4)))
            .await
            .unwrap();
        assert!(matches!(
            f.engine.submit_work_report(leave.id, "done").await,
            Err(EngineError::Validation(_))
        ));
    }

    #[actix_web::test]
    async fn work_report_buckets_follow_the_clock() {
        let f = fixture();
        let early = f.engine.submit_wfh(1, d(3, 3)).await.unwrap();
        let late = f.engine.submit_wfh(2, d(3, 6)).await.unwrap();
        f.engine.approve(early.id, 99, None).await.unwrap();
        f.engine.approve(late.id, 99, None).await.unwrap();

        f.clock.advance_days(4);
        let buckets = f.engine.work_reports(d(3, 1), d(3, 31), None).await.unwrap();
        assert_eq!(buckets.overdue.len(), 1);
        assert_eq!(buckets.overdue[0].request.id, early.id);
        assert_eq!(buckets.due_soon[0].request.id, late.id);

        f.engine.submit_work_report(early.id, "report").await.unwrap();
        let mine = f.engine.work_reports(d(3, 1), d(3, 31), Some(1)).await.unwrap();
        assert_eq!(mine.submitted.len(), 1);
        assert!(mine.overdue.is_empty() && mine.due_soon.is_empty());
    }

    #[actix_web::test]
    async fn approval_revalidates_the_leave_quota() {
        let f = fixture();
        seed_leave(&f.ledger, 1, LeaveCategory::PersonalLeave, d(1, 6), d(1, 10), 5, RequestStatus::Approved).await;
        let pending = seed_leave(&f.ledger, 1, LeaveCategory::PersonalLeave, d(3, 10), d(3, 12), 3, RequestStatus::Pending).await;

        assert_eq!(
            f.engine.approve(pending.id, 99, None).await.unwrap_err(),
            EngineError::QuotaExceeded(1)
        );
        assert_eq!(f.engine.get_request(pending.id).await.unwrap().status(), RequestStatus::Pending);
        // rejecting is always possible
        f.engine.reject(pending.id, 99, "over quota").await.unwrap();
    }

    #[actix_web::test]
    async fn approval_without_revalidation_accepts_overbooking() {
        let policy = EnginePolicy {
            revalidate_on_approval: false,
            ..EnginePolicy::default()
        };
        let f = fixture_with(policy);
        seed_leave(&f.ledger, 1, LeaveCategory::PersonalLeave, d(1, 6), d(1, 10), 5, RequestStatus::Approved).await;
        let pending = seed_leave(&f.ledger, 1, LeaveCategory::PersonalLeave, d(3, 10), d(3, 12), 3, RequestStatus::Pending).await;
        let approved = f.engine.approve(pending.id, 99, None).await.unwrap();
        assert_eq!(approved.status(), RequestStatus::Approved);
    }

    #[actix_web::test]
    async fn approval_revalidates_daily_capacity() {
        let f = fixture();
        let mut ids = Vec::new();
        for employee_id in 1..=3 {
            ids.push(f.engine.submit_wfh(employee_id, d(3, 10)).await.unwrap().id);
        }
        // within the cap every pending day can be approved
        for id in &ids {
            f.engine.approve(*id, 99, None).await.unwrap();
        }
        let calendar = f.engine.capacity_calendar(d(3, 10), d(3, 11)).await.unwrap();
        assert_eq!(calendar[0].approved, 3);
        assert_eq!(calendar[0].status, crate::engine::views::CapacityStatus::Full);
        assert_eq!(calendar[1].status, crate::engine::views::CapacityStatus::Available);
    }

    #[actix_web::test]
    async fn concurrent_wfh_submissions_never_exceed_the_daily_cap() {
        let f = fixture();
        let attempts = (1..=12).map(|employee_id| f.engine.submit_wfh(employee_id, d(3, 12)));
        let results = futures::future::join_all(attempts).await;

        let accepted = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(accepted, 3);
        assert!(results.iter().filter_map(|r| r.as_ref().err()).all(|e| *e
            == EngineError::DailyCapacityFull {
                date: d(3, 12),
                cap: 3
            }));
        let occupancy = f.engine.daily_occupancy(d(3, 12), d(3, 12)).await.unwrap();
        assert_eq!(occupancy[&d(3, 12)].total(), 3);
    }

    #[actix_web::test]
    async fn concurrent_leave_submissions_respect_the_quota() {
        let f = fixture();
        // six personal days in total; each request asks for four
        let attempts = [d(3, 10), d(3, 17), d(3, 24)].map(|monday| {
            f.engine.submit_leave(new_leave(1, LeaveCategory::PersonalLeave, monday, monday + chrono::Days::new(3)))
        });
        let results = futures::future::join_all(attempts).await;
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let entitlement = f.engine.get_entitlement(1, LeaveCategory::PersonalLeave, 2025).await.unwrap();
        assert_eq!(entitlement.used, 4);
    }

    #[actix_web::test]
    async fn upcoming_lists_approved_starts_in_the_window() {
        let f = fixture();
        let soon = f
            .engine
            .submit_leave(new_leave(1, LeaveCategory::SickLeave, d(3, 5), d(3, 7)))
            .await
            .unwrap();
        let later = f.engine.submit_wfh(2, d(3, 10)).await.unwrap();
        let unapproved = f.engine.submit_wfh(3, d(3, 4)).await.unwrap();
        f.engine.approve(soon.id, 99, None).await.unwrap();
        f.engine.approve(later.id, 99, None).await.unwrap();

        let upcoming = f.engine.upcoming().await.unwrap();
        let ids: Vec<Uuid> = upcoming.iter().map(Request::id).collect();
        assert_eq!(ids, vec![soon.id]);
        assert!(!ids.contains(&unapproved.id));
    }

    #[actix_web::test]
    async fn leave_views_reflect_the_ledger() {
        let f = fixture();
        f.engine
            .submit_leave(new_leave(1, LeaveCategory::SickLeave, d(3, 10), d(3, 11)))
            .await
            .unwrap();
        let rejected = f
            .engine
            .submit_leave(new_leave(2, LeaveCategory::SickLeave, d(3, 11), d(3, 11)))
            .await
            .unwrap();
        f.engine.reject(rejected.id, 99, "no").await.unwrap();

        let daily = f.engine.leave_occupancy(d(3, 10), d(3, 12)).await.unwrap();
        assert_eq!(daily[&d(3, 11)].pending, 1);
        assert_eq!(daily[&d(3, 12)].total(), 0);

        let summary = f.engine.leave_summary(1, 2025).await.unwrap();
        assert_eq!(summary[&LeaveCategory::SickLeave].days, 2);

        assert!(matches!(
            f.engine.daily_occupancy(d(1, 1), d(12, 31).with_year(2026).unwrap()).await,
            Err(EngineError::Validation(_))
        ));
    }
}
