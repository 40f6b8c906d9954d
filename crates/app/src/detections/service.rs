//! Detections service.
//!
//! Every upstream call is recorded: records are inserted as `pending` before the call and
//! moved to `completed` or `failed` once it returns.

use std::{sync::Arc, time::Instant};

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    card_detection::{
        CardDetectionApi, CardDetectionError, CheckCardRequest, CheckCardResultRequest,
    },
    database::Db,
    detections::{
        DetectionsServiceError,
        models::{
            CatalogProduct, CatalogRegion, CheckStatus, CheckSubmission, DetectionOutcome,
            DetectionRecord, History, HistoryQuery, NewDetection, Pagination, RecordIds,
            RECENT_CHECKS, ResultFetch, ServiceStatus, Stats, Summary,
        },
        repository::PgDetectionsRepository,
    },
};

const SUCCESS_CODE: i32 = 200;

#[derive(Clone)]
pub struct PgDetectionsService {
    db: Db,
    repository: PgDetectionsRepository,
    client: Option<Arc<dyn CardDetectionApi>>,
}

impl std::fmt::Debug for PgDetectionsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgDetectionsService")
            .field("enabled", &self.client.is_some())
            .finish_non_exhaustive()
    }
}

impl PgDetectionsService {
    /// `client` is `None` when card detection is disabled; queries still work.
    #[must_use]
    pub fn new(db: Db, client: Option<Arc<dyn CardDetectionApi>>) -> Self {
        Self {
            db,
            repository: PgDetectionsRepository::new(),
            client,
        }
    }

    fn client(&self) -> Result<&dyn CardDetectionApi, DetectionsServiceError> {
        self.client
            .as_deref()
            .ok_or(DetectionsServiceError::Unavailable)
    }

    async fn finish(
        &self,
        ids: &[i64],
        outcome: &DetectionOutcome,
    ) -> Result<(), DetectionsServiceError> {
        let mut tx = self.db.begin().await?;

        let updated = self.repository.finish_records(&mut tx, ids, outcome).await?;

        tx.commit().await?;

        if updated != ids.len() as u64 {
            warn!(
                expected = ids.len(),
                updated,
                status = %outcome.status,
                "detection records were no longer pending"
            );
        }

        Ok(())
    }
}

/// Drop repeated and blank card numbers, keeping first-seen order.
fn unique_cards(cards: &[String]) -> Vec<String> {
    let mut seen = FxHashSet::default();

    cards
        .iter()
        .map(|card| card.trim())
        .filter(|card| !card.is_empty() && seen.insert(*card))
        .map(str::to_string)
        .collect()
}

fn elapsed_millis(started: Instant) -> i32 {
    i32::try_from(started.elapsed().as_millis()).unwrap_or(i32::MAX)
}

fn failed_outcome(error: &CardDetectionError, response_time: i32) -> DetectionOutcome {
    DetectionOutcome {
        status: CheckStatus::Failed,
        check_result: None,
        error_message: Some(error.to_string()),
        response_code: error.code(),
        response_time,
    }
}

#[async_trait]
impl DetectionsService for PgDetectionsService {
    async fn check_card(
        &self,
        user_id: i64,
        request: &CheckCardRequest,
    ) -> Result<CheckSubmission, DetectionsServiceError> {
        let client = self.client()?;

        let request = CheckCardRequest {
            cards: unique_cards(&request.cards),
            ..request.clone()
        };

        request.validate()?;
        client.validate_config()?;

        let request_id = Uuid::new_v4();
        let mut record_ids = RecordIds::new();

        let mut tx = self.db.begin().await?;

        for card in &request.cards {
            let id = self
                .repository
                .insert_record(
                    &mut tx,
                    &NewDetection {
                        user_id,
                        request_id,
                        card_number: card,
                        pin_code: None,
                        product_mark: &request.product_mark,
                        region_id: request.region_id(),
                        region_name: request.region_name(),
                        auto_type: request.auto_type(),
                    },
                )
                .await?;

            record_ids.push(id);
        }

        tx.commit().await?;

        info!(
            user_id,
            %request_id,
            product_mark = %request.product_mark,
            cards_count = record_ids.len(),
            "card detection submitted"
        );

        let started = Instant::now();
        let response = client.check_card(&request).await;
        let response_time = elapsed_millis(started);

        match response {
            Ok(response) => {
                let outcome = DetectionOutcome {
                    status: CheckStatus::Completed,
                    check_result: serde_json::to_value(&response).ok(),
                    error_message: None,
                    response_code: response.code,
                    response_time,
                };

                self.finish(&record_ids, &outcome).await?;

                Ok(CheckSubmission {
                    request_id,
                    record_ids,
                    response,
                })
            }
            Err(error) => {
                warn!(user_id, %request_id, %error, "card detection failed");

                self.finish(&record_ids, &failed_outcome(&error, response_time))
                    .await?;

                Err(error.into())
            }
        }
    }

    async fn check_card_result(
        &self,
        user_id: i64,
        request: &CheckCardResultRequest,
    ) -> Result<ResultFetch, DetectionsServiceError> {
        let client = self.client()?;

        request.validate()?;
        client.validate_config()?;

        let request_id = Uuid::new_v4();

        let mut tx = self.db.begin().await?;

        let record_id = self
            .repository
            .insert_record(
                &mut tx,
                &NewDetection {
                    user_id,
                    request_id,
                    card_number: &request.card_no,
                    pin_code: request.pin_code(),
                    product_mark: &request.product_mark,
                    region_id: None,
                    region_name: None,
                    auto_type: None,
                },
            )
            .await?;

        tx.commit().await?;

        let started = Instant::now();
        let result = client.check_card_result(request).await;
        let response_time = elapsed_millis(started);

        match result {
            Ok(result) => {
                let outcome = DetectionOutcome {
                    status: CheckStatus::Completed,
                    check_result: serde_json::to_value(&result).ok(),
                    error_message: None,
                    response_code: SUCCESS_CODE,
                    response_time,
                };

                self.finish(&[record_id], &outcome).await?;

                Ok(ResultFetch { record_id, result })
            }
            Err(error) => {
                warn!(user_id, record_id, %error, "card result fetch failed");

                self.finish(&[record_id], &failed_outcome(&error, response_time))
                    .await?;

                Err(error.into())
            }
        }
    }

    async fn history(
        &self,
        user_id: i64,
        query: &HistoryQuery,
    ) -> Result<History, DetectionsServiceError> {
        let page = query.page();
        let page_size = query.page_size();
        let filter = query.filter();

        let mut tx = self.db.begin().await?;

        let records = self
            .repository
            .list_records(&mut tx, user_id, &filter, page_size, query.offset())
            .await?;

        let total = self.repository.count_records(&mut tx, user_id, &filter).await?;
        let summary = self.repository.summarize(&mut tx, user_id).await?;

        tx.commit().await?;

        Ok(History {
            records,
            pagination: Pagination::new(page, page_size, total),
            summary,
        })
    }

    async fn detail(
        &self,
        user_id: i64,
        id: i64,
    ) -> Result<DetectionRecord, DetectionsServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self.repository.find_record(&mut tx, user_id, id).await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn summary(&self, user_id: i64) -> Result<Summary, DetectionsServiceError> {
        let mut tx = self.db.begin().await?;

        let summary = self.repository.summarize(&mut tx, user_id).await?;

        tx.commit().await?;

        Ok(summary)
    }

    async fn stats(&self, user_id: i64) -> Result<Stats, DetectionsServiceError> {
        let mut tx = self.db.begin().await?;

        let summary = self.repository.summarize(&mut tx, user_id).await?;
        let product_stats = self.repository.product_stats(&mut tx, user_id).await?;
        let monthly_stats = self.repository.monthly_stats(&mut tx, user_id).await?;

        let recent_checks = self
            .repository
            .list_records(&mut tx, user_id, &HistoryQuery::default().filter(), RECENT_CHECKS, 0)
            .await?;

        tx.commit().await?;

        Ok(Stats {
            summary,
            product_stats,
            monthly_stats,
            recent_checks,
        })
    }

    async fn products(&self) -> Result<Vec<CatalogProduct>, DetectionsServiceError> {
        let mut tx = self.db.begin().await?;

        let products = self.repository.list_products(&mut tx).await?;

        tx.commit().await?;

        Ok(products)
    }

    async fn regions<'a>(
        &self,
        product_mark: Option<&'a str>,
    ) -> Result<Vec<CatalogRegion>, DetectionsServiceError> {
        let product_mark = product_mark.filter(|mark| !mark.is_empty());

        let mut tx = self.db.begin().await?;

        if let Some(mark) = product_mark
            && !self.repository.product_exists(&mut tx, mark).await?
        {
            return Err(DetectionsServiceError::ProductNotFound);
        }

        let regions = self.repository.list_regions(&mut tx, product_mark).await?;

        tx.commit().await?;

        Ok(regions)
    }

    fn status(&self) -> ServiceStatus {
        let Some(client) = &self.client else {
            return ServiceStatus {
                enabled: false,
                config_valid: false,
                config_error: None,
            };
        };

        match client.validate_config() {
            Ok(()) => ServiceStatus {
                enabled: true,
                config_valid: true,
                config_error: None,
            },
            Err(error) => ServiceStatus {
                enabled: true,
                config_valid: false,
                config_error: Some(error.message().to_string()),
            },
        }
    }
}

#[automock]
#[async_trait]
pub trait DetectionsService: Send + Sync {
    /// Record and submit a batch of cards under one correlation id.
    async fn check_card(
        &self,
        user_id: i64,
        request: &CheckCardRequest,
    ) -> Result<CheckSubmission, DetectionsServiceError>;

    /// Record and fetch the result for one card.
    async fn check_card_result(
        &self,
        user_id: i64,
        request: &CheckCardResultRequest,
    ) -> Result<ResultFetch, DetectionsServiceError>;

    async fn history(
        &self,
        user_id: i64,
        query: &HistoryQuery,
    ) -> Result<History, DetectionsServiceError>;

    /// A record owned by `user_id`; other users' records are reported as not found.
    async fn detail(&self, user_id: i64, id: i64)
    -> Result<DetectionRecord, DetectionsServiceError>;

    async fn summary(&self, user_id: i64) -> Result<Summary, DetectionsServiceError>;

    async fn stats(&self, user_id: i64) -> Result<Stats, DetectionsServiceError>;

    async fn products(&self) -> Result<Vec<CatalogProduct>, DetectionsServiceError>;

    async fn regions<'a>(
        &self,
        product_mark: Option<&'a str>,
    ) -> Result<Vec<CatalogRegion>, DetectionsServiceError>;

    fn status(&self) -> ServiceStatus;
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mockito::{Matcher, Server};
    use serde_json::json;
    use sqlx::query_scalar;
    use testresult::TestResult;

    use crate::{
        card_detection::{
            CardDetectionClient, CardDetectionConfig, CardResult, CheckCardResponse,
            ErrorKind, MockCardDetectionApi,
        },
        test::TestContext,
    };

    use super::*;

    fn itunes_us(cards: &[&str]) -> CheckCardRequest {
        CheckCardRequest {
            cards: cards.iter().map(|card| (*card).to_string()).collect(),
            product_mark: "iTunes".to_string(),
            region_id: Some(2),
            region_name: Some("美国".to_string()),
            auto_type: None,
        }
    }

    fn accepting_client() -> MockCardDetectionApi {
        let mut client = MockCardDetectionApi::new();

        client.expect_validate_config().returning(|| Ok(()));
        client.expect_check_card().returning(|_| {
            Ok(CheckCardResponse {
                code: 200,
                msg: String::new(),
                data: true,
            })
        });

        client
    }

    async fn record_count(ctx: &TestContext) -> TestResult<i64> {
        Ok(query_scalar("SELECT COUNT(*) FROM card_detection_records")
            .fetch_one(ctx.db.pool())
            .await?)
    }

    #[tokio::test]
    async fn submission_against_upstream_completes_records() -> TestResult {
        let ctx = TestContext::new().await;
        let mut server = Server::new_async().await;

        let mock = server
            .mock("POST", "/api/userApiManage/checkCard")
            .match_header("appId", "A")
            .match_body(Matcher::Regex(r#"^\{"data":"[0-9a-f]+"\}$"#.to_string()))
            .with_status(200)
            .with_body(r#"{"code":200,"msg":"","data":true}"#)
            .create_async()
            .await;

        let client = CardDetectionClient::new(CardDetectionConfig::new(
            server.url(),
            "A",
            "S",
            Some(Duration::from_secs(5)),
        ))?;

        let service = ctx.detections(Some(Arc::new(client)));

        let submission = service
            .check_card(7, &itunes_us(&["X123123123123123"]))
            .await?;

        mock.assert_async().await;

        assert!(submission.response.data);
        assert_eq!(submission.record_ids.len(), 1);

        let record = service.detail(7, submission.record_ids[0]).await?;

        assert_eq!(record.check_status, CheckStatus::Completed);
        assert_eq!(record.response_code, Some(200));
        assert!(record.response_time.is_some_and(|ms| ms >= 0));
        assert!(record.checked_at.is_some());
        assert_eq!(record.request_id, submission.request_id);
        assert_eq!(record.region_id, Some(2));
        assert_eq!(record.region_name.as_deref(), Some("美国"));
        assert_eq!(
            record.check_result,
            Some(json!({"code": 200, "msg": "", "data": true}))
        );

        Ok(())
    }

    #[tokio::test]
    async fn invalid_batches_insert_nothing() -> TestResult {
        let ctx = TestContext::new().await;

        let mut client = MockCardDetectionApi::new();
        client.expect_validate_config().returning(|| Ok(()));
        client.expect_check_card().never();

        let service = ctx.detections(Some(Arc::new(client)));

        let request = CheckCardRequest {
            product_mark: "iTunes".to_string(),
            ..CheckCardRequest::default()
        };

        let result = service.check_card(7, &request).await;

        let Err(DetectionsServiceError::CardDetection(error)) = result else {
            return Err("expected a card detection error".into());
        };

        assert_eq!(error.kind(), ErrorKind::InvalidRequest);
        assert_eq!(error.message(), "cards cannot be empty");
        assert_eq!(record_count(&ctx).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn batches_share_one_correlation_id() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.detections(Some(Arc::new(accepting_client())));

        let submission = service
            .check_card(7, &itunes_us(&["A1", "B2", "A1", " "]))
            .await?;

        assert_eq!(submission.record_ids.len(), 2);

        let ids: Vec<Uuid> =
            query_scalar("SELECT DISTINCT request_id FROM card_detection_records")
                .fetch_all(ctx.db.pool())
                .await?;

        assert_eq!(ids, vec![submission.request_id]);

        Ok(())
    }

    #[tokio::test]
    async fn upstream_failures_mark_records_failed() -> TestResult {
        let ctx = TestContext::new().await;

        let mut client = MockCardDetectionApi::new();
        client.expect_validate_config().returning(|| Ok(()));
        client
            .expect_check_card()
            .returning(|_| Err(CardDetectionError::new(ErrorKind::Timeout, "request timeout")));

        let service = ctx.detections(Some(Arc::new(client)));

        let result = service.check_card(7, &itunes_us(&["A1"])).await;

        assert!(matches!(result, Err(DetectionsServiceError::CardDetection(_))));

        let history = service.history(7, &HistoryQuery::default()).await?;
        let record = history.records.first().ok_or("record missing")?;

        assert_eq!(record.check_status, CheckStatus::Failed);
        assert_eq!(record.response_code, Some(1008));
        assert_eq!(
            record.error_message.as_deref(),
            Some("CardDetection Error 1008: request timeout")
        );
        assert_eq!(history.summary.failed, 1);

        Ok(())
    }

    #[tokio::test]
    async fn terminal_records_are_not_rewritten() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.detections(Some(Arc::new(accepting_client())));

        let submission = service.check_card(7, &itunes_us(&["A1"])).await?;

        let failed = DetectionOutcome {
            status: CheckStatus::Failed,
            check_result: None,
            error_message: Some("late".into()),
            response_code: 500,
            response_time: 1,
        };

        let mut tx = ctx.db.pool().begin().await?;
        let updated = PgDetectionsRepository::new()
            .finish_records(&mut tx, &submission.record_ids, &failed)
            .await?;
        tx.commit().await?;

        assert_eq!(updated, 0);

        let record = service.detail(7, submission.record_ids[0]).await?;
        assert_eq!(record.check_status, CheckStatus::Completed);

        Ok(())
    }

    #[tokio::test]
    async fn result_fetch_stores_the_decrypted_result() -> TestResult {
        let ctx = TestContext::new().await;

        let mut client = MockCardDetectionApi::new();
        client.expect_validate_config().returning(|| Ok(()));
        client.expect_check_card_result().returning(|request| {
            Ok(CardResult {
                card_no: request.card_no.clone(),
                status: 1,
                message: "valid".into(),
                ..CardResult::default()
            })
        });

        let service = ctx.detections(Some(Arc::new(client)));

        let fetched = service
            .check_card_result(
                9,
                &CheckCardResultRequest {
                    product_mark: "nike".into(),
                    card_no: "N-1".into(),
                    pin_code: Some("123456".into()),
                },
            )
            .await?;

        let record = service.detail(9, fetched.record_id).await?;

        assert_eq!(record.check_status, CheckStatus::Completed);
        assert_eq!(record.pin_code.as_deref(), Some("123456"));
        assert_eq!(
            record
                .check_result
                .as_ref()
                .and_then(|result| result.get("cardNo"))
                .and_then(|card| card.as_str()),
            Some("N-1")
        );

        Ok(())
    }

    #[tokio::test]
    async fn records_are_scoped_to_their_owner() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.detections(Some(Arc::new(accepting_client())));

        let submission = service.check_card(1, &itunes_us(&["A1"])).await?;
        let id = submission.record_ids[0];

        assert!(service.detail(1, id).await.is_ok());
        assert!(matches!(
            service.detail(2, id).await,
            Err(DetectionsServiceError::NotFound)
        ));

        let history = service.history(2, &HistoryQuery::default()).await?;
        assert!(history.records.is_empty());
        assert_eq!(history.summary.total, 0);

        Ok(())
    }

    #[tokio::test]
    async fn history_filters_and_paginates() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.detections(Some(Arc::new(accepting_client())));

        service.check_card(1, &itunes_us(&["A1", "A2", "A3"])).await?;

        let xbox = CheckCardRequest {
            cards: vec!["XB-1".into()],
            product_mark: "xBox".into(),
            region_id: None,
            region_name: Some("美国".into()),
            auto_type: None,
        };

        service.check_card(1, &xbox).await?;

        let page = service
            .history(
                1,
                &HistoryQuery {
                    page: Some(2),
                    page_size: Some(3),
                    ..HistoryQuery::default()
                },
            )
            .await?;

        assert_eq!(page.records.len(), 1);
        assert_eq!(page.pagination.total, 4);
        assert_eq!(page.pagination.total_pages, 2);
        assert!(!page.pagination.has_next);
        assert!(page.pagination.has_previous);

        let by_product = service
            .history(
                1,
                &HistoryQuery {
                    product_mark: Some("xBox".into()),
                    ..HistoryQuery::default()
                },
            )
            .await?;

        assert_eq!(by_product.pagination.total, 1);
        assert_eq!(by_product.records[0].card_number, "XB-1");

        let by_card = service
            .history(
                1,
                &HistoryQuery {
                    card_number: Some("A2".into()),
                    ..HistoryQuery::default()
                },
            )
            .await?;

        assert_eq!(by_card.records.len(), 1);
        assert_eq!(by_card.pagination.total, 1);

        let stats = service.stats(1).await?;

        assert_eq!(stats.summary.total, 4);
        assert!((stats.summary.success_rate - 100.0).abs() < f64::EPSILON);
        assert_eq!(stats.recent_checks.len(), 4);
        assert_eq!(stats.product_stats[0].product_mark, "iTunes");
        assert_eq!(stats.product_stats[0].total, 3);
        assert_eq!(stats.monthly_stats.len(), 1);
        assert_eq!(stats.monthly_stats[0].total, 4);

        Ok(())
    }

    #[tokio::test]
    async fn pages_past_the_end_are_empty() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.detections(Some(Arc::new(accepting_client())));

        service.check_card(1, &itunes_us(&["A1", "A2"])).await?;

        let history = service
            .history(
                1,
                &HistoryQuery {
                    page: Some(i64::MAX),
                    ..HistoryQuery::default()
                },
            )
            .await?;

        assert!(history.records.is_empty());
        assert_eq!(history.pagination.page, i64::MAX);
        assert_eq!(history.pagination.total, 2);
        assert!(!history.pagination.has_next);

        Ok(())
    }

    #[tokio::test]
    async fn disabled_client_is_unavailable() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.detections(None);

        assert!(matches!(
            service.check_card(1, &itunes_us(&["A1"])).await,
            Err(DetectionsServiceError::Unavailable)
        ));

        assert_eq!(
            service.status(),
            ServiceStatus {
                enabled: false,
                config_valid: false,
                config_error: None,
            }
        );

        assert_eq!(service.summary(1).await?.total, 0);

        Ok(())
    }

    #[tokio::test]
    async fn catalog_lists_products_and_regions() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.detections(None);

        let products = service.products().await?;
        assert_eq!(products.len(), 7);
        assert_eq!(products[0].product_mark, "sephora");

        let regions = service.regions(Some("iTunes")).await?;
        assert_eq!(regions.len(), 11);
        assert_eq!(regions[0].region_name, "英国");

        assert!(service.regions(None).await?.len() > regions.len());

        assert!(matches!(
            service.regions(Some("steam")).await,
            Err(DetectionsServiceError::ProductNotFound)
        ));

        Ok(())
    }

    #[test]
    fn unique_cards_keeps_first_seen_order() {
        let cards = ["B", "A", "B", "", " A "].map(String::from);

        assert_eq!(unique_cards(&cards), vec!["B".to_string(), "A".to_string()]);
    }
}
