//! Read-only projections over the ledger. Recomputed on every call, never stored.

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use strum::IntoEnumIterator;

use crate::engine::calendar::DateRange;
use crate::model::leave_request::{LeaveCategory, LeaveRequest};
use crate::model::request::{EmployeeId, Request, RequestStatus};
use crate::model::wfh_request::WfhRequest;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DayOccupancy {
    pub approved: u32,
    pub pending: u32,
}

impl DayOccupancy {
    pub fn total(&self) -> u32 {
        self.approved + self.pending
    }

    fn record(&mut self, status: RequestStatus) {
        match status {
            RequestStatus::Approved => self.approved += 1,
            RequestStatus::Pending => self.pending += 1,
            RequestStatus::Rejected => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityStatus {
    Available,
    Limited,
    Full,
}

impl CapacityStatus {
    pub fn of(occupancy: &DayOccupancy, cap: u32) -> Self {
        match occupancy.total() {
            0 => CapacityStatus::Available,
            n if n >= cap => CapacityStatus::Full,
            _ => CapacityStatus::Limited,
        }
    }
}

/// Active WFH requests per day of `range`. Every day of the range is present.
pub fn wfh_occupancy<'a>(
    requests: impl IntoIterator<Item = &'a WfhRequest>,
    range: DateRange,
) -> BTreeMap<NaiveDate, DayOccupancy> {
    let mut days: BTreeMap<NaiveDate, DayOccupancy> = range.days().map(|d| (d, DayOccupancy::default())).collect();
    for request in requests {
        if let Some(day) = days.get_mut(&request.wfh_date) {
            day.record(request.status);
        }
    }
    days
}

/// Active leave requests covering each day of `range`.
pub fn leave_occupancy<'a>(
    requests: impl IntoIterator<Item = &'a LeaveRequest>,
    range: DateRange,
) -> BTreeMap<NaiveDate, DayOccupancy> {
    let mut days: BTreeMap<NaiveDate, DayOccupancy> = range.days().map(|d| (d, DayOccupancy::default())).collect();
    for request in requests {
        if request.end_date < request.start_date {
            continue;
        }
        for (_, day) in days.range_mut(request.start_date..=request.end_date) {
            day.record(request.status);
        }
    }
    days
}

/// One calendar cell: occupancy plus its colour against the cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacityDay {
    pub date: NaiveDate,
    pub approved: u32,
    pub pending: u32,
    pub total: u32,
    pub status: CapacityStatus,
}

pub fn capacity_calendar(occupancy: &BTreeMap<NaiveDate, DayOccupancy>, cap: u32) -> Vec<CapacityDay> {
    occupancy
        .iter()
        .map(|(date, day)| CapacityDay {
            date: *date,
            approved: day.approved,
            pending: day.pending,
            total: day.total(),
            status: CapacityStatus::of(day, cap),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub requests: u32,
    pub days: u32,
}

/// Active leave of one employee per category, for the year the leave starts in.
pub fn leave_summary<'a>(
    requests: impl IntoIterator<Item = &'a LeaveRequest>,
    employee_id: EmployeeId,
    year: i32,
) -> BTreeMap<LeaveCategory, CategorySummary> {
    let mut summary: BTreeMap<LeaveCategory, CategorySummary> =
        LeaveCategory::iter().map(|c| (c, CategorySummary::default())).collect();
    for request in requests {
        if request.employee_id != employee_id || !request.status.is_active() || request.start_date.year() != year {
            continue;
        }
        let entry = summary.entry(request.category).or_default();
        entry.requests += 1;
        entry.days += request.leave_days;
    }
    summary
}

/// Approved requests starting within `[today, today + window_days]`, earliest first.
pub fn upcoming(requests: impl IntoIterator<Item = Request>, today: NaiveDate, window_days: u32) -> Vec<Request> {
    let horizon = today
        .checked_add_days(Days::new(u64::from(window_days)))
        .unwrap_or(NaiveDate::MAX);
    let mut found: Vec<Request> = requests
        .into_iter()
        .filter(|r| r.status() == RequestStatus::Approved)
        .filter(|r| (today..=horizon).contains(&r.start_date()))
        .collect();
    found.sort_by_key(|r| (r.start_date(), r.employee_id()));
    found
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutstandingReport {
    pub request: WfhRequest,
    pub days_overdue: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkReportBuckets {
    pub submitted: Vec<WfhRequest>,
    /// reached or passed its date, still within the grace period
    pub due_soon: Vec<OutstandingReport>,
    pub overdue: Vec<OutstandingReport>,
}

/// Approved WFH days whose date has arrived, split by report state.
/// Reports are due from the WFH date itself; after `grace_days` they are overdue.
pub fn work_report_buckets<'a>(
    requests: impl IntoIterator<Item = &'a WfhRequest>,
    today: NaiveDate,
    grace_days: i64,
) -> WorkReportBuckets {
    let mut buckets = WorkReportBuckets::default();
    for request in requests {
        if request.status != RequestStatus::Approved || request.wfh_date > today {
            continue;
        }
        if request.work_report.is_some() {
            buckets.submitted.push(request.clone());
            continue;
        }
        let days_overdue = (today - request.wfh_date).num_days();
        let outstanding = OutstandingReport {
            request: request.clone(),
            days_overdue,
        };
        if days_overdue > grace_days {
            buckets.overdue.push(outstanding);
        } else {
            buckets.due_soon.push(outstanding);
        }
    }
    buckets.overdue.sort_by_key(|r| std::cmp::Reverse(r.days_overdue));
    buckets
}
