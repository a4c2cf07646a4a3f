use serde::Deserialize;

/// Upper bound on a single page, whatever the client asks for.
pub const MAX_PAGE_SIZE: i64 = 50;

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 { 1 }
fn default_limit() -> i64 { 20 }

impl PaginationParams {
    pub fn new(page: i64, limit: i64) -> Self {
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1)).saturating_mul(self.limit()).max(0)
    }

    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: default_page(), limit: default_limit() }
    }
}
