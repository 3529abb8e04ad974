use serde::{Deserialize, Serialize};

use super::GameResult;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MakeMoveRequest {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub piece: String,
    #[serde(default)]
    pub notation: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FinishGameRequest {
    pub result: GameResult,
}

/// Raw `?page=&limit=` query. Anything unparseable or out of range falls back to defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PaginationQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.limit as usize
    }
}

impl From<PaginationQuery> for Pagination {
    fn from(query: PaginationQuery) -> Self {
        let page = query
            .page
            .and_then(|p| p.parse::<u32>().ok())
            .filter(|p| *p > 0)
            .unwrap_or(DEFAULT_PAGE);
        let limit = query
            .limit
            .and_then(|l| l.parse::<u32>().ok())
            .filter(|l| *l > 0 && *l <= MAX_LIMIT)
            .unwrap_or(DEFAULT_LIMIT);
        Pagination { page, limit }
    }
}
