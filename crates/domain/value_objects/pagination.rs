use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Validated page window handed to repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl TryFrom<PageQuery> for Page {
    type Error = String;

    fn try_from(query: PageQuery) -> Result<Self, Self::Error> {
        let page = query.page.unwrap_or(1);
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);

        if page < 1 {
            return Err("page must be a positive number".to_string());
        }
        if limit < 1 {
            return Err("limit must be a positive number".to_string());
        }
        if limit > MAX_PAGE_LIMIT {
            return Err(format!("limit must be <= {}", MAX_PAGE_LIMIT));
        }
        if (page - 1).checked_mul(limit).is_none() {
            return Err("page is too large".to_string());
        }

        Ok(Self { page, limit })
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub page: i64,
    pub limit: i64,
    pub results: Vec<T>,
}
