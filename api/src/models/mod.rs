// API request/response models
pub mod boost;
pub mod premium;
pub mod ticket;
pub mod wallet;

use serde::Deserialize;

pub const DEFAULT_PAGE_LIMIT: u64 = 20;
pub const MAX_PAGE_LIMIT: u64 = 100;

/// Limit/offset parameters shared by list endpoints
#[derive(Debug, Deserialize, Default, Clone, Copy)]
pub struct PageParams {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl PageParams {
    /// Clamps the requested window to `1..=MAX_PAGE_LIMIT`
    pub fn window(&self) -> (u64, u64) {
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT);
        (limit, self.offset.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_window_defaults_and_clamps() {
        assert_eq!(PageParams::default().window(), (20, 0));
        let params = PageParams {
            limit: Some(1000),
            offset: Some(40),
        };
        assert_eq!(params.window(), (100, 40));
        let params = PageParams {
            limit: Some(0),
            offset: None,
        };
        assert_eq!(params.window(), (1, 0));
    }
}
