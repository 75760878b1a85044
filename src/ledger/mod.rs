//! The request ledger: durable store of leave and WFH requests.
//!
//! Every check-then-write sequence of the engine runs inside one `LedgerTx`
//! opened with the `LockScope` of the resources it contends for.

pub mod locks;
pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::engine::calendar::DateRange;
use crate::engine::error::EngineError;
use crate::model::leave_request::{LeaveCategory, LeaveRequest};
use crate::model::request::{Decision, EmployeeId, Request, RequestStatus};
use crate::model::wfh_request::{WfhRequest, WorkReport};

/// A contended resource.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LockKey {
    Employee(EmployeeId),
    Date(NaiveDate),
    Request(Uuid),
}

/// Resources a transaction must hold exclusively. Iterates in a fixed global order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockScope {
    keys: BTreeSet<LockKey>,
}

impl LockScope {
    pub fn employee(employee_id: EmployeeId) -> Self {
        Self::default().with(LockKey::Employee(employee_id))
    }

    pub fn with(mut self, key: LockKey) -> Self {
        self.keys.insert(key);
        self
    }

    pub fn with_date(self, date: NaiveDate) -> Self {
        self.with(LockKey::Date(date))
    }

    pub fn keys(&self) -> impl Iterator<Item = &LockKey> {
        self.keys.iter()
    }
}

/// Filter for ledger reads. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerQuery {
    pub employee_id: Option<EmployeeId>,
    pub statuses: Vec<RequestStatus>,
    /// keep requests whose span intersects this window
    pub window: Option<DateRange>,
    /// leave requests only; ignored for WFH reads
    pub category: Option<LeaveCategory>,
}

impl LedgerQuery {
    pub fn all() -> Self {
        Self::default()
    }

    /// Pending and Approved.
    pub fn active() -> Self {
        Self {
            statuses: vec![RequestStatus::Pending, RequestStatus::Approved],
            ..Self::default()
        }
    }

    pub fn for_employee(mut self, employee_id: EmployeeId) -> Self {
        self.employee_id = Some(employee_id);
        self
    }

    pub fn within(mut self, window: DateRange) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_status(mut self, status: RequestStatus) -> Self {
        self.statuses = vec![status];
        self
    }

    pub fn with_category(mut self, category: LeaveCategory) -> Self {
        self.category = Some(category);
        self
    }

    fn status_matches(&self, status: RequestStatus) -> bool {
        self.statuses.is_empty() || self.statuses.contains(&status)
    }

    pub fn matches_leave(&self, request: &LeaveRequest) -> bool {
        self.employee_id.is_none_or(|id| id == request.employee_id)
            && self.status_matches(request.status)
            && self.category.is_none_or(|c| c == request.category)
            && self
                .window
                .is_none_or(|w| w.overlaps(request.start_date, request.end_date))
    }

    pub fn matches_wfh(&self, request: &WfhRequest) -> bool {
        self.employee_id.is_none_or(|id| id == request.employee_id)
            && self.status_matches(request.status)
            && self.window.is_none_or(|w| w.contains(request.wfh_date))
    }
}

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Opens a transaction holding every key of `scope`.
    async fn begin(&self, scope: LockScope) -> Result<Box<dyn LedgerTx>, EngineError>;

    async fn leave_requests(&self, query: &LedgerQuery) -> Result<Vec<LeaveRequest>, EngineError>;

    async fn wfh_requests(&self, query: &LedgerQuery) -> Result<Vec<WfhRequest>, EngineError>;

    async fn find(&self, id: Uuid) -> Result<Option<Request>, EngineError>;
}

/// Reads see the transaction's own staged writes. Dropping without `commit` discards them.
#[async_trait]
pub trait LedgerTx: Send {
    async fn leave_requests(&mut self, query: &LedgerQuery) -> Result<Vec<LeaveRequest>, EngineError>;

    async fn wfh_requests(&mut self, query: &LedgerQuery) -> Result<Vec<WfhRequest>, EngineError>;

    async fn find(&mut self, id: Uuid) -> Result<Option<Request>, EngineError>;

    async fn insert_leave(&mut self, request: &LeaveRequest) -> Result<(), EngineError>;

    async fn insert_wfh(&mut self, request: &WfhRequest) -> Result<(), EngineError>;

    /// Moves a Pending request to `status`. Returns false when it was not Pending.
    async fn decide(&mut self, id: Uuid, status: RequestStatus, decision: &Decision) -> Result<bool, EngineError>;

    /// Stores a report on an Approved WFH request without one. Returns false otherwise.
    async fn attach_work_report(&mut self, id: Uuid, report: &WorkReport) -> Result<bool, EngineError>;

    async fn commit(self: Box<Self>) -> Result<(), EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    #[test]
    fn scope_orders_keys_and_dedupes() {
        let scope = LockScope::employee(7)
            .with_date(d(10))
            .with(LockKey::Employee(7))
            .with(LockKey::Employee(3));
        let keys: Vec<_> = scope.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![LockKey::Employee(3), LockKey::Employee(7), LockKey::Date(d(10))]
        );
    }

    #[test]
    fn query_window_matches_overlap_for_leave_and_day_for_wfh() {
        let leave = LeaveRequest {
            id: Uuid::new_v4(),
            employee_id: 1,
            requested_at: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            start_date: d(10),
            end_date: d(14),
            category: LeaveCategory::SickLeave,
            leave_days: 5,
            reason: None,
            status: RequestStatus::Pending,
            decision: None,
        };
        let query = LedgerQuery::active().for_employee(1).within(DateRange::new(d(14), d(20)).unwrap());
        assert!(query.matches_leave(&leave));
        assert!(!query.clone().with_category(LeaveCategory::AnnualLeave).matches_leave(&leave));
        assert!(!LedgerQuery::active().for_employee(2).matches_leave(&leave));

        let wfh = WfhRequest::pending(1, d(13), Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
        assert!(!query.matches_wfh(&wfh));
        assert!(LedgerQuery::all().with_status(RequestStatus::Pending).matches_wfh(&wfh));
    }
}
