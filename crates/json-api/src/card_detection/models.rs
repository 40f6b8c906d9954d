//! Card detection request and response bodies.

use std::string::ToString;

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use trusioo_app::{
    card_detection::{CardResult, CheckCardRequest, CheckCardResultRequest},
    detections::{
        CatalogProduct, CatalogRegion, CheckSubmission, DetectionRecord, History, MonthlyStat,
        Pagination, ProductStat, ResultFetch, ServiceStatus, Stats, Summary,
    },
};

/// Cards to submit, in the upstream's field naming
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CheckCardBody {
    pub cards: Vec<String>,

    /// Case-sensitive product tag, e.g. `iTunes`
    pub product_mark: String,

    #[serde(default)]
    pub region_id: Option<i32>,

    #[serde(default)]
    pub region_name: Option<String>,

    #[serde(default)]
    pub auto_type: Option<i32>,
}

impl From<CheckCardBody> for CheckCardRequest {
    fn from(body: CheckCardBody) -> Self {
        CheckCardRequest {
            cards: body.cards,
            product_mark: body.product_mark,
            region_id: body.region_id,
            region_name: body.region_name,
            auto_type: body.auto_type,
        }
    }
}

/// One card to fetch a result for
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CheckCardResultBody {
    pub product_mark: String,
    pub card_no: String,

    /// Required for `sephora`, `nike` and `nd`
    #[serde(default)]
    pub pin_code: Option<String>,
}

impl From<CheckCardResultBody> for CheckCardResultRequest {
    fn from(body: CheckCardResultBody) -> Self {
        CheckCardResultRequest {
            product_mark: body.product_mark,
            card_no: body.card_no,
            pin_code: body.pin_code,
        }
    }
}

/// Upstream acknowledgement of a submitted batch
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CheckSubmissionResponse {
    /// Correlation id shared by every record of the batch
    pub request_id: String,

    pub record_ids: Vec<i64>,
    pub code: i32,
    pub msg: String,
    pub data: bool,
}

impl From<CheckSubmission> for CheckSubmissionResponse {
    fn from(submission: CheckSubmission) -> Self {
        Self {
            request_id: submission.request_id.to_string(),
            record_ids: submission.record_ids.into_iter().collect(),
            code: submission.response.code,
            msg: submission.response.msg,
            data: submission.response.data,
        }
    }
}

/// Decrypted card result
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CardResultResponse {
    pub card_no: String,

    /// `0` waiting, `1` testing, `2` valid, `3` invalid, `4` redeemed, `5` failed, `6` low points
    pub status: i64,

    pub pin_code: String,
    pub message: String,

    /// `YYYY-MM-DD HH:MM:SS`, or the upstream text as sent
    pub check_time: String,

    pub region_name: String,
    pub region_id: i64,
}

impl From<CardResult> for CardResultResponse {
    fn from(result: CardResult) -> Self {
        Self {
            check_time: result.check_time_string(),
            card_no: result.card_no,
            status: result.status,
            pin_code: result.pin_code,
            message: result.message,
            region_name: result.region_name,
            region_id: result.region_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ResultFetchResponse {
    pub record_id: i64,
    pub result: CardResultResponse,
}

impl From<ResultFetch> for ResultFetchResponse {
    fn from(fetch: ResultFetch) -> Self {
        Self {
            record_id: fetch.record_id,
            result: fetch.result.into(),
        }
    }
}

/// A stored detection attempt for one card
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct RecordResponse {
    pub id: i64,
    pub request_id: String,
    pub card_number: String,
    pub pin_code: Option<String>,
    pub product_mark: String,
    pub region_id: Option<i32>,
    pub region_name: Option<String>,
    pub auto_type: Option<i32>,

    /// `pending`, `completed` or `failed`
    pub check_status: String,

    pub check_result: Option<Value>,
    pub error_message: Option<String>,
    pub response_code: Option<i32>,

    /// Upstream round trip in milliseconds
    pub response_time: Option<i32>,

    pub checked_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<DetectionRecord> for RecordResponse {
    fn from(record: DetectionRecord) -> Self {
        Self {
            id: record.id,
            request_id: record.request_id.to_string(),
            card_number: record.card_number,
            pin_code: record.pin_code,
            product_mark: record.product_mark,
            region_id: record.region_id,
            region_name: record.region_name,
            auto_type: record.auto_type,
            check_status: record.check_status.to_string(),
            check_result: record.check_result,
            error_message: record.error_message,
            response_code: record.response_code,
            response_time: record.response_time,
            checked_at: record.checked_at.as_ref().map(ToString::to_string),
            created_at: record.created_at.to_string(),
            updated_at: record.updated_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PaginationResponse {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl From<Pagination> for PaginationResponse {
    fn from(pagination: Pagination) -> Self {
        Self {
            page: pagination.page,
            page_size: pagination.page_size,
            total: pagination.total,
            total_pages: pagination.total_pages,
            has_next: pagination.has_next,
            has_previous: pagination.has_previous,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SummaryResponse {
    pub total: i64,
    pub success: i64,
    pub failed: i64,
    pub pending: i64,

    /// Percentage of completed records
    pub success_rate: f64,

    pub last_check_at: Option<String>,
}

impl From<Summary> for SummaryResponse {
    fn from(summary: Summary) -> Self {
        Self {
            total: summary.total,
            success: summary.success,
            failed: summary.failed,
            pending: summary.pending,
            success_rate: summary.success_rate,
            last_check_at: summary.last_check_at.as_ref().map(ToString::to_string),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct HistoryResponse {
    pub records: Vec<RecordResponse>,
    pub pagination: PaginationResponse,
    pub summary: SummaryResponse,
}

impl From<History> for HistoryResponse {
    fn from(history: History) -> Self {
        Self {
            records: history.records.into_iter().map(Into::into).collect(),
            pagination: history.pagination.into(),
            summary: history.summary.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ProductStatResponse {
    pub product_mark: String,
    pub total: i64,
    pub success: i64,
    pub failed: i64,
}

impl From<ProductStat> for ProductStatResponse {
    fn from(stat: ProductStat) -> Self {
        Self {
            product_mark: stat.product_mark,
            total: stat.total,
            success: stat.success,
            failed: stat.failed,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct MonthlyStatResponse {
    pub month: String,
    pub total: i64,
    pub success: i64,
    pub failed: i64,
}

impl From<MonthlyStat> for MonthlyStatResponse {
    fn from(stat: MonthlyStat) -> Self {
        Self {
            month: stat.month,
            total: stat.total,
            success: stat.success,
            failed: stat.failed,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct StatsResponse {
    pub summary: SummaryResponse,
    pub product_stats: Vec<ProductStatResponse>,
    pub monthly_stats: Vec<MonthlyStatResponse>,

    /// Five most recent records
    pub recent_checks: Vec<RecordResponse>,
}

impl From<Stats> for StatsResponse {
    fn from(stats: Stats) -> Self {
        Self {
            summary: stats.summary.into(),
            product_stats: stats.product_stats.into_iter().map(Into::into).collect(),
            monthly_stats: stats.monthly_stats.into_iter().map(Into::into).collect(),
            recent_checks: stats.recent_checks.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ProductResponse {
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

impl From<CatalogProduct> for ProductResponse {
    fn from(product: CatalogProduct) -> Self {
        Self {
            id: product.id,
            product_mark: product.product_mark,
            product_name: product.product_name,
            requires_region: product.requires_region,
            requires_pin: product.requires_pin,
            card_format: product.card_format,
            card_length_min: product.card_length_min,
            card_length_max: product.card_length_max,
            pin_length: product.pin_length,
            validation_pattern: product.validation_pattern,
            supports_auto_type: product.supports_auto_type,
            status: product.status,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ProductsResponse {
    pub products: Vec<ProductResponse>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct RegionResponse {
    pub id: i32,
    pub product_mark: String,
    pub region_id: String,
    pub region_name: String,
    pub region_name_en: String,
    pub status: String,
    pub sort_order: i32,
}

impl From<CatalogRegion> for RegionResponse {
    fn from(region: CatalogRegion) -> Self {
        Self {
            id: region.id,
            product_mark: region.product_mark,
            region_id: region.region_id,
            region_name: region.region_name,
            region_name_en: region.region_name_en,
            status: region.status,
            sort_order: region.sort_order,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct RegionsResponse {
    pub regions: Vec<RegionResponse>,
    pub total: usize,

    /// The filter that was applied, if any
    pub product_mark: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct StatusResponse {
    pub enabled: bool,
    pub config_valid: bool,
    pub config_error: Option<String>,
}

impl From<ServiceStatus> for StatusResponse {
    fn from(status: ServiceStatus) -> Self {
        Self {
            enabled: status.enabled,
            config_valid: status.config_valid,
            config_error: status.config_error,
        }
    }
}
