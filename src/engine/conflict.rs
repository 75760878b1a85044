use chrono::NaiveDate;
use uuid::Uuid;

use crate::engine::calendar::ranges_overlap;
use crate::engine::error::EngineError;
use crate::model::request::Request;

/// First active request whose span intersects `[start, end]`. Rejected entries never conflict.
pub fn find_conflict<'a>(
    start: NaiveDate,
    end: NaiveDate,
    existing: impl IntoIterator<Item = &'a Request>,
) -> Option<Uuid> {
    existing
        .into_iter()
        .filter(|r| r.status().is_active())
        .find(|r| {
            let (s, e) = r.span();
            ranges_overlap(start, end, s, e)
        })
        .map(Request::id)
}

pub fn ensure_no_conflict<'a>(
    start: NaiveDate,
    end: NaiveDate,
    existing: impl IntoIterator<Item = &'a Request>,
) -> Result<(), EngineError> {
    match find_conflict(start, end, existing) {
        Some(id) => Err(EngineError::DateRangeConflict(id)),
        None => Ok(()),
    }
}
