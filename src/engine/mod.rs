//! The leave & remote-work request engine.
//!
//! `LeaveEngine` owns no state of its own: every count it checks or reports is
//! recomputed from the ledger. Writes live in `workflow`, read models here.

pub mod calendar;
pub mod capacity;
pub mod clock;
pub mod conflict;
pub mod error;
pub mod policy;
pub mod quota;
pub mod views;
mod workflow;

use chrono::{Datelike, Days, NaiveDate};
use std::collections::BTreeMap;
use std::sync::Arc;
use strum::IntoEnumIterator;
use uuid::Uuid;

use crate::directory::EmployeeDirectory;
use crate::ledger::{Ledger, LedgerQuery};
use crate::model::employee::EmployeeProfile;
use crate::model::leave_request::{LeaveCategory, LeaveRequest};
use crate::model::request::{EmployeeId, Request, RequestStatus};
use crate::model::wfh_request::WfhRequest;
use calendar::{DateRange, YearMonth};
use capacity::MonthlyUsage;
use clock::Clock;
use error::EngineError;
use policy::{Eligibility, EnginePolicy};
use quota::Entitlement;
use views::{CapacityDay, CategorySummary, DayOccupancy, WorkReportBuckets};

/// Longest window a calendar or report view may span.
pub const MAX_VIEW_DAYS: i64 = 366;

pub struct LeaveEngine {
    ledger: Arc<dyn Ledger>,
    directory: Arc<dyn EmployeeDirectory>,
    policy: EnginePolicy,
    clock: Arc<dyn Clock>,
}

impl LeaveEngine {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        directory: Arc<dyn EmployeeDirectory>,
        policy: EnginePolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            directory,
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> &EnginePolicy {
        &self.policy
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    async fn profile(&self, employee_id: EmployeeId) -> Result<EmployeeProfile, EngineError> {
        self.directory
            .get_employee(employee_id)
            .await?
            .ok_or(EngineError::UnknownEmployee(employee_id))
    }

    async fn is_eligible(&self, employee_id: EmployeeId, eligibility: Eligibility) -> Result<bool, EngineError> {
        match eligibility {
            Eligibility::Always => Ok(true),
            rule => {
                let profile = self.profile(employee_id).await?;
                Ok(rule.is_met(profile.hire_date, self.clock.today()))
            }
        }
    }

    fn view_range(start: NaiveDate, end: NaiveDate) -> Result<DateRange, EngineError> {
        let range = DateRange::new(start, end)?;
        if range.len_days() > MAX_VIEW_DAYS {
            return Err(EngineError::validation(format!(
                "date window may span at most {} days",
                MAX_VIEW_DAYS
            )));
        }
        Ok(range)
    }

    pub async fn get_request(&self, id: Uuid) -> Result<Request, EngineError> {
        self.ledger.find(id).await?.ok_or(EngineError::NotFound(id))
    }

    pub async fn get_entitlement(
        &self,
        employee_id: EmployeeId,
        category: LeaveCategory,
        year: i32,
    ) -> Result<Entitlement, EngineError> {
        let booked = self
            .ledger
            .leave_requests(&LedgerQuery::active().for_employee(employee_id).with_category(category))
            .await?;
        let requestable = self
            .is_eligible(employee_id, self.policy.entitlements.rule(category).eligibility)
            .await?;
        Ok(quota::evaluate(&self.policy.entitlements, category, year, &booked, requestable))
    }

    /// Every category at once, in declaration order.
    pub async fn entitlements(&self, employee_id: EmployeeId, year: i32) -> Result<Vec<Entitlement>, EngineError> {
        let booked = self
            .ledger
            .leave_requests(&LedgerQuery::active().for_employee(employee_id))
            .await?;
        let mut overview = Vec::new();
        for category in LeaveCategory::iter() {
            let requestable = self
                .is_eligible(employee_id, self.policy.entitlements.rule(category).eligibility)
                .await?;
            overview.push(quota::evaluate(
                &self.policy.entitlements,
                category,
                year,
                &booked,
                requestable,
            ));
        }
        Ok(overview)
    }

    /// The employee's Pending and Approved requests of both kinds, by start date.
    pub async fn list_active(&self, employee_id: EmployeeId) -> Result<Vec<Request>, EngineError> {
        let query = LedgerQuery::active().for_employee(employee_id);
        let mut active: Vec<Request> = self
            .ledger
            .leave_requests(&query)
            .await?
            .into_iter()
            .map(Request::from)
            .collect();
        active.extend(self.ledger.wfh_requests(&query).await?.into_iter().map(Request::from));
        active.sort_by_key(|r| (r.start_date(), r.id()));
        Ok(active)
    }

    pub async fn daily_occupancy(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, DayOccupancy>, EngineError> {
        let range = Self::view_range(start, end)?;
        let requests = self
            .ledger
            .wfh_requests(&LedgerQuery::active().within(range))
            .await?;
        Ok(views::wfh_occupancy(&requests, range))
    }

    /// `daily_occupancy` coloured against the daily cap.
    pub async fn capacity_calendar(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<CapacityDay>, EngineError> {
        let occupancy = self.daily_occupancy(start, end).await?;
        Ok(views::capacity_calendar(&occupancy, self.policy.capacity.daily_cap))
    }

    pub async fn leave_occupancy(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, DayOccupancy>, EngineError> {
        let range = Self::view_range(start, end)?;
        let requests = self
            .ledger
            .leave_requests(&LedgerQuery::active().within(range))
            .await?;
        Ok(views::leave_occupancy(&requests, range))
    }

    pub async fn leave_summary(
        &self,
        employee_id: EmployeeId,
        year: i32,
    ) -> Result<BTreeMap<LeaveCategory, CategorySummary>, EngineError> {
        let requests = self
            .ledger
            .leave_requests(&LedgerQuery::active().for_employee(employee_id))
            .await?;
        Ok(views::leave_summary(&requests, employee_id, year))
    }

    /// Approved leave and WFH starting within the configured look-ahead window.
    pub async fn upcoming(&self) -> Result<Vec<Request>, EngineError> {
        let today = self.clock.today();
        let window_days = self.policy.upcoming_window_days;
        let horizon = today
            .checked_add_days(Days::new(u64::from(window_days)))
            .unwrap_or(NaiveDate::MAX);
        let query = LedgerQuery::all()
            .with_status(RequestStatus::Approved)
            .within(DateRange::new(today, horizon)?);

        let mut requests: Vec<Request> = self
            .ledger
            .leave_requests(&query)
            .await?
            .into_iter()
            .map(Request::from)
            .collect();
        requests.extend(self.ledger.wfh_requests(&query).await?.into_iter().map(Request::from));
        Ok(views::upcoming(requests, today, window_days))
    }

    pub async fn work_reports(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        employee_id: Option<EmployeeId>,
    ) -> Result<WorkReportBuckets, EngineError> {
        let range = Self::view_range(start, end)?;
        let mut query = LedgerQuery::all().with_status(RequestStatus::Approved).within(range);
        query.employee_id = employee_id;
        let requests = self.ledger.wfh_requests(&query).await?;
        Ok(views::work_report_buckets(
            &requests,
            self.clock.today(),
            self.policy.report_grace_days,
        ))
    }

    /// WFH days the employee holds in `month` against their position's cap.
    pub async fn monthly_usage(&self, employee_id: EmployeeId, month: YearMonth) -> Result<MonthlyUsage, EngineError> {
        let profile = self.profile(employee_id).await?;
        let cap = self.policy.capacity.monthly_cap_for(&profile.position);
        let requests = self
            .ledger
            .wfh_requests(&LedgerQuery::active().for_employee(employee_id).within(month.range()))
            .await?;
        Ok(capacity::monthly_usage(&requests, employee_id, month, cap))
    }

    pub async fn list_leave(&self, query: &LedgerQuery) -> Result<Vec<LeaveRequest>, EngineError> {
        let mut requests = self.ledger.leave_requests(query).await?;
        requests.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        Ok(requests)
    }

    pub async fn list_wfh(&self, query: &LedgerQuery) -> Result<Vec<WfhRequest>, EngineError> {
        let mut requests = self.ledger.wfh_requests(query).await?;
        requests.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        Ok(requests)
    }

    /// Calendar year "today" falls in.
    pub fn current_year(&self) -> i32 {
        self.clock.today().year()
    }
}
