use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::leave_request::LeaveRequest;
use crate::model::wfh_request::WfhRequest;

pub const DEFAULT_PER_PAGE: u64 = 10;
pub const MAX_PER_PAGE: u64 = 100;

#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
pub struct PageParams {
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>, // 1-based
    #[schema(example = 10)]
    /// Items per page, at most 100
    pub per_page: Option<u64>,
}

impl PageParams {
    /// (page, per_page, offset) with defaults applied and bounds clamped.
    pub fn resolve(&self) -> (u64, u64, u64) {
        let per_page = self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
        let page = self.page.unwrap_or(1).max(1);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[aliases(LeavePage = Page<LeaveRequest>, WfhPage = Page<WfhRequest>)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: u64,
}

impl<T> Page<T> {
    /// Cuts one page out of an already ordered result set.
    pub fn slice(items: Vec<T>, params: &PageParams) -> Self {
        let (page, per_page, offset) = params.resolve();
        let total = items.len() as u64;
        let data = items
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(per_page as usize)
            .collect();
        Page {
            data,
            page,
            per_page,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_page_is_clamped() {
        let params = PageParams {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(params.resolve(), (1, 100, 0));
        assert_eq!(PageParams::default().resolve(), (1, 10, 0));
    }

    #[test]
    fn slices_the_requested_page() {
        let params = PageParams {
            page: Some(3),
            per_page: Some(4),
        };
        let page = Page::slice((1..=10).collect::<Vec<u32>>(), &params);
        assert_eq!(page.data, vec![9, 10]);
        assert_eq!(page.total, 10);

        let past_the_end = Page::slice(vec![1, 2], &params);
        assert!(past_the_end.data.is_empty());
        assert_eq!(past_the_end.total, 2);
    }
}
