//! Detections Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{
    FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar,
};

use crate::detections::models::{
    CatalogProduct, CatalogRegion, CheckStatus, DetectionOutcome, DetectionRecord, HistoryFilter,
    MonthlyStat, NewDetection, ProductStat, Summary,
};

const INSERT_RECORD_SQL: &str = include_str!("sql/insert_record.sql");
const FINISH_RECORDS_SQL: &str = include_str!("sql/finish_records.sql");
const LIST_RECORDS_SQL: &str = include_str!("sql/list_records.sql");
const COUNT_RECORDS_SQL: &str = include_str!("sql/count_records.sql");
const FIND_RECORD_SQL: &str = include_str!("sql/find_record.sql");
const SUMMARIZE_RECORDS_SQL: &str = include_str!("sql/summarize_records.sql");
const PRODUCT_STATS_SQL: &str = include_str!("sql/product_stats.sql");
const MONTHLY_STATS_SQL: &str = include_str!("sql/monthly_stats.sql");
const LIST_PRODUCTS_SQL: &str = include_str!("sql/list_products.sql");
const PRODUCT_EXISTS_SQL: &str = include_str!("sql/product_exists.sql");
const LIST_REGIONS_SQL: &str = include_str!("sql/list_regions.sql");

/// Bind values for the optional history filters, in `$2..$4` order.
fn filter_binds(filter: &HistoryFilter) -> (Option<&str>, Option<&str>, Option<&str>) {
    match filter {
        HistoryFilter::All => (None, None, None),
        HistoryFilter::Status(status) => (Some(status.as_str()), None, None),
        HistoryFilter::ProductMark(mark) => (None, Some(mark), None),
        HistoryFilter::CardNumber(card) => (None, None, Some(card)),
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgDetectionsRepository;

impl PgDetectionsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn insert_record(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        record: &NewDetection<'_>,
    ) -> Result<i64, sqlx::Error> {
        query_scalar::<Postgres, i64>(INSERT_RECORD_SQL)
            .bind(record.user_id)
            .bind(record.request_id)
            .bind(record.card_number)
            .bind(record.pin_code)
            .bind(record.product_mark)
            .bind(record.region_id)
            .bind(record.region_name)
            .bind(record.auto_type)
            .fetch_one(&mut **tx)
            .await
    }

    /// Move pending records to their terminal state. Records already finished are untouched.
    pub(crate) async fn finish_records(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        ids: &[i64],
        outcome: &DetectionOutcome,
    ) -> Result<u64, sqlx::Error> {
        let result = query(FINISH_RECORDS_SQL)
            .bind(ids)
            .bind(outcome.status.as_str())
            .bind(&outcome.check_result)
            .bind(&outcome.error_message)
            .bind(outcome.response_code)
            .bind(outcome.response_time)
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected())
    }

    pub(crate) async fn list_records(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: i64,
        filter: &HistoryFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DetectionRecord>, sqlx::Error> {
        let (status, product_mark, card_number) = filter_binds(filter);

        query_as::<Postgres, DetectionRecord>(LIST_RECORDS_SQL)
            .bind(user_id)
            .bind(status)
            .bind(product_mark)
            .bind(card_number)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn count_records(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: i64,
        filter: &HistoryFilter,
    ) -> Result<i64, sqlx::Error> {
        let (status, product_mark, card_number) = filter_binds(filter);

        query_scalar::<Postgres, i64>(COUNT_RECORDS_SQL)
            .bind(user_id)
            .bind(status)
            .bind(product_mark)
            .bind(card_number)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn find_record(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: i64,
        id: i64,
    ) -> Result<DetectionRecord, sqlx::Error> {
        query_as::<Postgres, DetectionRecord>(FIND_RECORD_SQL)
            .bind(id)
            .bind(user_id)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn summarize(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: i64,
    ) -> Result<Summary, sqlx::Error> {
        let row = query(SUMMARIZE_RECORDS_SQL)
            .bind(user_id)
            .fetch_one(&mut **tx)
            .await?;

        Ok(Summary::new(
            row.try_get("total")?,
            row.try_get("success")?,
            row.try_get("failed")?,
            row.try_get("pending")?,
            row.try_get::<Option<SqlxTimestamp>, _>("last_check_at")?
                .map(SqlxTimestamp::to_jiff),
        ))
    }

    pub(crate) async fn product_stats(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: i64,
    ) -> Result<Vec<ProductStat>, sqlx::Error> {
        let rows = query(PRODUCT_STATS_SQL)
            .bind(user_id)
            .fetch_all(&mut **tx)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(ProductStat {
                    product_mark: row.try_get("product_mark")?,
                    total: row.try_get("total")?,
                    success: row.try_get("success")?,
                    failed: row.try_get("failed")?,
                })
            })
            .collect()
    }

    /// Per-month counts for the current month and the eleven before it.
    pub(crate) async fn monthly_stats(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: i64,
    ) -> Result<Vec<MonthlyStat>, sqlx::Error> {
        let rows = query(MONTHLY_STATS_SQL)
            .bind(user_id)
            .fetch_all(&mut **tx)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(MonthlyStat {
                    month: row.try_get("month")?,
                    total: row.try_get("total")?,
                    success: row.try_get("success")?,
                    failed: row.try_get("failed")?,
                })
            })
            .collect()
    }

    pub(crate) async fn list_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<CatalogProduct>, sqlx::Error> {
        query_as::<Postgres, CatalogProduct>(LIST_PRODUCTS_SQL)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn product_exists(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product_mark: &str,
    ) -> Result<bool, sqlx::Error> {
        query_scalar::<Postgres, bool>(PRODUCT_EXISTS_SQL)
            .bind(product_mark)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_regions(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product_mark: Option<&str>,
    ) -> Result<Vec<CatalogRegion>, sqlx::Error> {
        query_as::<Postgres, CatalogRegion>(LIST_REGIONS_SQL)
            .bind(product_mark)
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for DetectionRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: &str = row.try_get("check_status")?;

        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            request_id: row.try_get("request_id")?,
            card_number: row.try_get("card_number")?,
            pin_code: row.try_get("pin_code")?,
            product_mark: row.try_get("product_mark")?,
            region_id: row.try_get("region_id")?,
            region_name: row.try_get("region_name")?,
            auto_type: row.try_get("auto_type")?,
            check_status: status.parse::<CheckStatus>().map_err(|error| {
                sqlx::Error::ColumnDecode {
                    index: "check_status".to_string(),
                    source: error.into(),
                }
            })?,
            check_result: row.try_get("check_result")?,
            error_message: row.try_get("error_message")?,
            response_code: row.try_get("response_code")?,
            response_time: row.try_get("response_time")?,
            checked_at: row
                .try_get::<Option<SqlxTimestamp>, _>("checked_at")?
                .map(SqlxTimestamp::to_jiff),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for CatalogProduct {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            product_mark: row.try_get("product_mark")?,
            product_name: row.try_get("product_name")?,
            requires_region: row.try_get("requires_region")?,
            requires_pin: row.try_get("requires_pin")?,
            card_format: row.try_get("card_format")?,
            card_length_min: row.try_get("card_length_min")?,
            card_length_max: row.try_get("card_length_max")?,
            pin_length: row.try_get("pin_length")?,
            validation_pattern: row.try_get("validation_pattern")?,
            supports_auto_type: row.try_get("supports_auto_type")?,
            status: row.try_get("status")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for CatalogRegion {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            product_mark: row.try_get("product_mark")?,
            region_id: row.try_get("region_id")?,
            region_name: row.try_get("region_name")?,
            region_name_en: row.try_get("region_name_en")?,
            status: row.try_get("status")?,
            sort_order: row.try_get("sort_order")?,
        })
    }
}
