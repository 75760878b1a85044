pub mod error;
pub mod leave_request;
pub mod requests;
pub mod wfh_request;

use chrono::NaiveDate;

use crate::engine::calendar::DateRange;
use crate::engine::error::EngineError;

// DATE column bounds, used for open-ended list filters
fn earliest() -> NaiveDate {
    NaiveDate::from_ymd_opt(1000, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn latest() -> NaiveDate {
    NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX)
}

/// Optional `from`/`to` list filter; either bound may be left open.
fn list_window(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Option<DateRange>, EngineError> {
    if from.is_none() && to.is_none() {
        return Ok(None);
    }
    DateRange::new(from.unwrap_or_else(earliest), to.unwrap_or_else(latest)).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_bounds_fall_back_to_column_limits() {
        let from = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(list_window(None, None).unwrap(), None);
        let window = list_window(Some(from), None).unwrap().unwrap();
        assert_eq!((window.start(), window.end()), (from, latest()));
        assert!(list_window(Some(from), Some(from.pred_opt().unwrap())).is_err());
    }
}
