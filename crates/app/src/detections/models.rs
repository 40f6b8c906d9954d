//! Detection Models

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde_json::Value;
use smallvec::SmallVec;
use uuid::Uuid;

use crate::card_detection::{CardResult, CheckCardResponse};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const RECENT_CHECKS: i64 = 5;

/// Lifecycle of a detection record. Only `Pending` may transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckStatus {
    Pending,
    Completed,
    Failed,
}

impl CheckStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown check status: {other}")),
        }
    }
}

/// One card of one detection attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionRecord {
    pub id: i64,
    pub user_id: i64,
    pub request_id: Uuid,
    pub card_number: String,
    pub pin_code: Option<String>,
    pub product_mark: String,
    pub region_id: Option<i32>,
    pub region_name: Option<String>,
    pub auto_type: Option<i32>,
    pub check_status: CheckStatus,
    pub check_result: Option<Value>,
    pub error_message: Option<String>,
    pub response_code: Option<i32>,
    pub response_time: Option<i32>,
    pub checked_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub(crate) struct NewDetection<'a> {
    pub user_id: i64,
    pub request_id: Uuid,
    pub card_number: &'a str,
    pub pin_code: Option<&'a str>,
    pub product_mark: &'a str,
    pub region_id: Option<i32>,
    pub region_name: Option<&'a str>,
    pub auto_type: Option<i32>,
}

/// Terminal state written once the upstream call returns.
#[derive(Debug, Clone)]
pub(crate) struct DetectionOutcome {
    pub status: CheckStatus,
    pub check_result: Option<Value>,
    pub error_message: Option<String>,
    pub response_code: i32,
    pub response_time: i32,
}

pub type RecordIds = SmallVec<[i64; 8]>;

/// Accepted batch submission.
#[derive(Debug, Clone)]
pub struct CheckSubmission {
    pub request_id: Uuid,
    pub record_ids: RecordIds,
    pub response: CheckCardResponse,
}

/// Fetched result for one card.
#[derive(Debug, Clone)]
pub struct ResultFetch {
    pub record_id: i64,
    pub result: CardResult,
}

/// At most one filter applies: status, then product mark, then card number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryFilter {
    All,
    Status(CheckStatus),
    ProductMark(String),
    CardNumber(String),
}

#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub status: Option<String>,
    pub product_mark: Option<String>,
    pub card_number: Option<String>,
}

impl HistoryQuery {
    /// Page number, at least 1.
    #[must_use]
    pub fn page(&self) -> i64 {
        self.page.filter(|page| *page >= 1).unwrap_or(1)
    }

    /// Page size, falling back to the default outside `1..=100`.
    #[must_use]
    pub fn page_size(&self) -> i64 {
        self.page_size
            .filter(|size| (1..=MAX_PAGE_SIZE).contains(size))
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Rows to skip. Saturates for absurd page numbers, which then read as an empty page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.page_size())
    }

    /// The single filter that applies. Unknown statuses fall through to the next filter.
    #[must_use]
    pub fn filter(&self) -> HistoryFilter {
        let present = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());

        if let Some(status) = present(&self.status).and_then(|s| s.parse().ok()) {
            return HistoryFilter::Status(status);
        }

        if let Some(mark) = present(&self.product_mark) {
            return HistoryFilter::ProductMark(mark);
        }

        if let Some(card) = present(&self.card_number) {
            return HistoryFilter::CardNumber(card);
        }

        HistoryFilter::All
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl Pagination {
    #[must_use]
    pub fn new(page: i64, page_size: i64, total: i64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + page_size - 1) / page_size
        };

        Self {
            page,
            page_size,
            total,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total: i64,
    pub success: i64,
    pub failed: i64,
    pub pending: i64,
    pub success_rate: f64,
    pub last_check_at: Option<Timestamp>,
}

impl Summary {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(
        total: i64,
        success: i64,
        failed: i64,
        pending: i64,
        last_check_at: Option<Timestamp>,
    ) -> Self {
        let success_rate = if total == 0 {
            0.0
        } else {
            success as f64 / total as f64 * 100.0
        };

        Self {
            total,
            success,
            failed,
            pending,
            success_rate,
            last_check_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct History {
    pub records: Vec<DetectionRecord>,
    pub pagination: Pagination,
    pub summary: Summary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductStat {
    pub product_mark: String,
    pub total: i64,
    pub success: i64,
    pub failed: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyStat {
    /// `YYYY-MM`
    pub month: String,
    pub total: i64,
    pub success: i64,
    pub failed: i64,
}

#[derive(Debug, Clone)]
pub struct Stats {
    pub summary: Summary,
    pub product_stats: Vec<ProductStat>,
    pub monthly_stats: Vec<MonthlyStat>,
    pub recent_checks: Vec<DetectionRecord>,
}

/// Row of `cd_products`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogProduct {
    pub id: i32,
    pub product_mark: String,
    pub product_name: String,
    pub requires_region: bool,
    pub requires_pin: bool,
    pub card_format: String,
    pub card_length_min: i32,
    pub card_length_max: i32,
    pub pin_length: Option<i32>,
    pub validation_pattern: Option<String>,
    pub supports_auto_type: bool,
    pub status: String,
}

/// Row of `cd_regions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRegion {
    pub id: i32,
    pub product_mark: String,
    pub region_id: String,
    pub region_name: String,
    pub region_name_en: String,
    pub status: String,
    pub sort_order: i32,
}

/// Whether the upstream client is usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceStatus {
    pub enabled: bool,
    pub config_valid: bool,
    pub config_error: Option<String>,
}
