use serde::Deserialize;

use crate::error::ApiError;

pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    /// Resolves `(offset, limit)`, capping the page at [`MAX_PAGE_SIZE`].
    pub fn resolve(&self) -> Result<(i64, i64), ApiError> {
        let skip = self.skip.unwrap_or(0);
        let limit = self.limit.unwrap_or(MAX_PAGE_SIZE);

        if skip < 0 || limit < 0 {
            return Err(ApiError::InvalidRequest(
                "skip and limit must not be negative".into(),
            ));
        }

        Ok((skip, limit.min(MAX_PAGE_SIZE)))
    }
}
