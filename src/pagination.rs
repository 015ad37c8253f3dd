use serde::Deserialize;
use utoipa::IntoParams;

const MAX_LIMIT: u64 = 100;

/// Optional offset window. Without `page` and `limit` the full list is returned.
#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
pub struct Pagination {
    #[param(minimum = 1)]
    pub page: Option<u64>,
    #[param(minimum = 1, maximum = 100)]
    pub limit: Option<u64>,
}

impl Pagination {
    pub fn is_requested(&self) -> bool {
        self.page.is_some() || self.limit.is_some()
    }

    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(10).clamp(1, MAX_LIMIT)
    }

    pub fn offset(&self) -> u64 {
        (self.page.unwrap_or(1).max(1) - 1) * self.limit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_parameters_mean_full_listing() {
        assert!(!Pagination::default().is_requested());
    }

    #[test]
    fn window_is_clamped() {
        let p = Pagination { page: Some(3), limit: Some(500) };
        assert_eq!(p.limit(), 100);
        assert_eq!(p.offset(), 200);

        let p = Pagination { page: Some(0), limit: None };
        assert_eq!(p.offset(), 0);
        assert_eq!(p.limit(), 10);
    }
}
