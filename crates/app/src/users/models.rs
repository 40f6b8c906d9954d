//! User Management Models

use crate::auth::Profile;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Registration and activity counters over the `users` table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserStats {
    pub total_users: i64,
    pub active_users: i64,
    pub inactive_users: i64,
    pub registered_today: i64,
    pub registered_this_week: i64,
    pub registered_this_month: i64,
}

#[derive(Debug, Clone, Default)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub status: Option<String>,
    pub email: Option<String>,
}

impl UserListQuery {
    #[must_use]
    pub fn page(&self) -> i64 {
        self.page.filter(|page| *page >= 1).unwrap_or(1)
    }

    /// Requested size capped at 100; anything below 1 uses the default.
    #[must_use]
    pub fn page_size(&self) -> i64 {
        match self.page_size {
            Some(size) if size > MAX_PAGE_SIZE => MAX_PAGE_SIZE,
            Some(size) if size >= 1 => size,
            _ => DEFAULT_PAGE_SIZE,
        }
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.page_size())
    }

    /// `None` for `all`, missing or unrecognised statuses.
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status
            .as_deref()
            .filter(|status| matches!(*status, "active" | "inactive"))
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct UserPage {
    pub total: i64,
    pub page: i64,
    pub size: i64,
    pub users: Vec<Profile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_capped() {
        let query = |page_size| UserListQuery {
            page_size,
            ..UserListQuery::default()
        };

        assert_eq!(query(None).page_size(), 20);
        assert_eq!(query(Some(0)).page_size(), 20);
        assert_eq!(query(Some(35)).page_size(), 35);
        assert_eq!(query(Some(500)).page_size(), 100);
    }

    #[test]
    fn offset_never_overflows() {
        let query = |page, page_size| UserListQuery {
            page: Some(page),
            page_size: Some(page_size),
            ..UserListQuery::default()
        };

        assert_eq!(query(2, 35).offset(), 35);
        assert_eq!(query(i64::MAX, 100).offset(), i64::MAX);
    }

    #[test]
    fn all_status_means_no_filter() {
        let query = |status: &str| UserListQuery {
            status: Some(status.to_string()),
            ..UserListQuery::default()
        };

        assert_eq!(query("active").status(), Some("active"));
        assert_eq!(query("inactive").status(), Some("inactive"));
        assert_eq!(query("all").status(), None);
        assert_eq!(query("banned").status(), None);
    }
}
