use chrono::NaiveDate;
use serde::Serialize;

use crate::engine::calendar::{DateRange, YearMonth};
use crate::engine::error::EngineError;
use crate::engine::views::wfh_occupancy;
use crate::model::request::EmployeeId;
use crate::model::wfh_request::WfhRequest;

/// Refuses `date` when its active WFH count already reached `cap`.
/// The count comes from the same occupancy view the calendar renders.
pub fn ensure_daily_capacity<'a>(
    requests: impl IntoIterator<Item = &'a WfhRequest>,
    date: NaiveDate,
    cap: u32,
) -> Result<(), EngineError> {
    let occupancy = wfh_occupancy(requests, DateRange::single(date));
    let taken = occupancy.get(&date).map(|day| day.total()).unwrap_or(0);
    if taken >= cap {
        return Err(EngineError::DailyCapacityFull { date, cap });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyUsage {
    pub month: YearMonth,
    pub used: u32,
    pub cap: u32,
    pub remaining: u32,
}

/// Active WFH days an employee holds within `month`.
pub fn monthly_usage<'a>(
    requests: impl IntoIterator<Item = &'a WfhRequest>,
    employee_id: EmployeeId,
    month: YearMonth,
    cap: u32,
) -> MonthlyUsage {
    let range = month.range();
    let used = requests
        .into_iter()
        .filter(|r| r.employee_id == employee_id && r.status.is_active() && range.contains(r.wfh_date))
        .count() as u32;
    MonthlyUsage {
        month,
        used,
        cap,
        remaining: cap.saturating_sub(used),
    }
}

pub fn ensure_monthly_capacity(usage: &MonthlyUsage) -> Result<(), EngineError> {
    if usage.used >= usage.cap {
        return Err(EngineError::MonthlyCapacityExceeded(usage.remaining));
    }
    Ok(())
}
