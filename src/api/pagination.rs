//! Pagination query parameters for list endpoints

use serde::Deserialize;

use crate::error::ApiError;
use crate::store::Page;

/// `?limit=&offset=`
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    pub const DEFAULT_LIMIT: i64 = 5;
    pub const MAX_LIMIT: i64 = 50;

    /// Validated window; out-of-range values are rejected, not clamped
    pub fn page(&self) -> Result<Page, ApiError> {
        let limit = self.limit.unwrap_or(Self::DEFAULT_LIMIT);
        if !(0..=Self::MAX_LIMIT).contains(&limit) {
            return Err(ApiError::bad_request(format!(
                "invalid limit, min = 0, max = {}",
                Self::MAX_LIMIT
            )));
        }

        let offset = self.offset.unwrap_or(0);
        if offset < 0 {
            return Err(ApiError::bad_request("invalid offset, min = 0"));
        }

        Ok(Page::new(limit, offset))
    }
}
