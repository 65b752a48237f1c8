//! Integration tests for order ingestion and the tracking
//! reconciliation loop, with a scriptable marketplace order client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal_macros::dec;
use sqlx::PgPool;

use flipline_db::models::order::{CreateFulfillment, CreateOrder};
use flipline_db::repositories::{OrderRepo, TransitionRepo};
use flipline_ebay::{EbayError, OrderClient, OrderDetails};
use flipline_pipeline::config::ConfigProvider;
use flipline_pipeline::{orders, tracking, PipelineError};

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

struct MemoryConfig {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryConfig {
    fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            values: Mutex::new(
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
        }
    }

    /// Tight retry policy so passes can be chained without waiting.
    fn fast_retries() -> Self {
        Self::new(&[
            ("tracking.retry_interval_mins", "0"),
            ("tracking.max_attempts", "2"),
        ])
    }
}

#[async_trait]
impl ConfigProvider for MemoryConfig {
    async fn get(&self, key: &str) -> Result<Option<String>, PipelineError> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PipelineError> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// How the mock answers `upload_tracking`.
#[derive(Clone, Copy)]
enum UploadMode {
    Ok,
    RetryableFail,
    NonRetryableFail,
}

struct MockOrders {
    uploads: AtomicUsize,
    mode: Mutex<UploadMode>,
    /// Answer for `check_tracking_uploaded`.
    tracking_present: AtomicBool,
}

impl MockOrders {
    fn new(mode: UploadMode) -> Self {
        Self {
            uploads: AtomicUsize::new(0),
            mode: Mutex::new(mode),
            tracking_present: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl OrderClient for MockOrders {
    async fn upload_tracking(
        &self,
        _order_key: &str,
        _carrier: &str,
        _tracking_number: &str,
    ) -> Result<(), EbayError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        match *self.mode.lock().unwrap() {
            UploadMode::Ok => Ok(()),
            UploadMode::RetryableFail => Err(EbayError::Transport("timeout".into())),
            UploadMode::NonRetryableFail => Err(EbayError::Auth("token revoked".into())),
        }
    }

    async fn check_tracking_uploaded(&self, _order_key: &str) -> Result<bool, EbayError> {
        Ok(self.tracking_present.load(Ordering::SeqCst))
    }

    async fn get_order(&self, order_key: &str) -> Result<OrderDetails, EbayError> {
        Ok(OrderDetails {
            order_key: order_key.to_string(),
            buyer_username: None,
            fulfillment_started: false,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn shipped_order(pool: &PgPool, config: &MemoryConfig, key: &str) -> i64 {
    let order = orders::ingest_sale(
        pool,
        config,
        &CreateOrder {
            ebay_order_key: key.to_string(),
            candidate_id: None,
            sale_price_usd: dec!(183.80),
        },
        "test",
    )
    .await
    .unwrap();
    orders::record_fulfillment(
        pool,
        config,
        &CreateFulfillment {
            order_id: order.id,
            carrier: "JPPOST".to_string(),
            tracking_number: "EM123456789JP".to_string(),
            shipped_at: Utc::now(),
        },
        "test",
    )
    .await
    .unwrap();
    orders::mark_shipped(pool, config, order.id, "test").await.unwrap();
    order.id
}

// ---------------------------------------------------------------------------
// Order lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn sale_ingestion_is_idempotent(pool: PgPool) {
    let config = MemoryConfig::new(&[]);
    let dto = CreateOrder {
        ebay_order_key: "ORDER-1".to_string(),
        candidate_id: None,
        sale_price_usd: dec!(99.99),
    };
    let first = orders::ingest_sale(&pool, &config, &dto, "test").await.unwrap();
    let second = orders::ingest_sale(&pool, &config, &dto, "test").await.unwrap();
    assert_eq!(first.id, second.id);

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count.0, 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn shipping_requires_fulfillment(pool: PgPool) {
    let config = MemoryConfig::new(&[]);
    let order = orders::ingest_sale(
        &pool,
        &config,
        &CreateOrder {
            ebay_order_key: "ORDER-2".to_string(),
            candidate_id: None,
            sale_price_usd: dec!(50),
        },
        "test",
    )
    .await
    .unwrap();

    let err = orders::mark_shipped(&pool, &config, order.id, "test")
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

// ---------------------------------------------------------------------------
// Tracking reconciliation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn successful_upload_completes_order(pool: PgPool) {
    let config = MemoryConfig::fast_retries();
    let client = MockOrders::new(UploadMode::Ok);
    let order_id = shipped_order(&pool, &config, "ORDER-3").await;

    let summary = tracking::run_tracking_pass(&pool, &config, &client, "worker")
        .await
        .unwrap();
    assert_eq!(summary.selected, 1);
    assert_eq!(summary.uploaded, 1);

    let order = OrderRepo::find_by_id(&pool, order_id).await.unwrap().unwrap();
    assert_eq!(order.state, "TRACKING_UPLOADED");

    // Completed orders are never selected again.
    let next = tracking::run_tracking_pass(&pool, &config, &client, "worker")
        .await
        .unwrap();
    assert_eq!(next.selected, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn retry_budget_exhaustion_is_terminal(pool: PgPool) {
    let config = MemoryConfig::fast_retries(); // max_attempts = 2
    let client = MockOrders::new(UploadMode::RetryableFail);
    let order_id = shipped_order(&pool, &config, "ORDER-4").await;

    // Two failing attempts, then the third pass declares terminal
    // failure without calling the marketplace again.
    for expected_attempts in [1, 2] {
        let summary = tracking::run_tracking_pass(&pool, &config, &client, "worker")
            .await
            .unwrap();
        assert_eq!(summary.failed_attempts, 1);
        let order = OrderRepo::find_by_id(&pool, order_id).await.unwrap().unwrap();
        assert_eq!(order.tracking_attempts, expected_attempts);
        assert_eq!(order.state, "SHIPPED_INTL");
        assert!(order.tracking_started_at.is_some());
    }

    let summary = tracking::run_tracking_pass(&pool, &config, &client, "worker")
        .await
        .unwrap();
    assert_eq!(summary.terminal, 1);
    assert_eq!(client.uploads.load(Ordering::SeqCst), 2);

    let order = OrderRepo::find_by_id(&pool, order_id).await.unwrap().unwrap();
    assert_eq!(order.state, "TRACKING_FAILED");
    assert!(order.tracking_terminal_at.is_some());

    // Terminal orders are never selected again.
    let next = tracking::run_tracking_pass(&pool, &config, &client, "worker")
        .await
        .unwrap();
    assert_eq!(next.selected, 0);
    assert_eq!(client.uploads.load(Ordering::SeqCst), 2);

    // The terminal audit entry bakes in the retry history.
    let history = TransitionRepo::list_for_entity(&pool, "order", order_id, 10)
        .await
        .unwrap();
    let terminal = &history[0];
    assert_eq!(terminal.reason_code.as_deref(), Some("TRACKING_EXHAUSTED"));
    let detail = terminal.reason_detail.as_deref().unwrap();
    assert!(detail.contains("attempts=2"));
    assert!(detail.contains("timeout"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn ambiguous_failure_recovers_via_verification(pool: PgPool) {
    let config = MemoryConfig::fast_retries();
    let client = MockOrders::new(UploadMode::RetryableFail);
    // The upload "fails" but the tracking actually landed.
    client.tracking_present.store(true, Ordering::SeqCst);
    let order_id = shipped_order(&pool, &config, "ORDER-5").await;

    let summary = tracking::run_tracking_pass(&pool, &config, &client, "worker")
        .await
        .unwrap();
    assert_eq!(summary.recovered, 1);
    assert_eq!(summary.failed_attempts, 0);

    let order = OrderRepo::find_by_id(&pool, order_id).await.unwrap().unwrap();
    assert_eq!(order.state, "TRACKING_UPLOADED");
    // No attempt was consumed.
    assert_eq!(order.tracking_attempts, 0);

    // Recovered successes are audited distinctly.
    let history = TransitionRepo::list_for_entity(&pool, "order", order_id, 10)
        .await
        .unwrap();
    assert_eq!(history[0].reason_code.as_deref(), Some("TRACKING_RECOVERED"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn non_retryable_failure_is_terminal_immediately(pool: PgPool) {
    let config = MemoryConfig::fast_retries();
    let client = MockOrders::new(UploadMode::NonRetryableFail);
    let order_id = shipped_order(&pool, &config, "ORDER-6").await;

    let summary = tracking::run_tracking_pass(&pool, &config, &client, "worker")
        .await
        .unwrap();
    assert_eq!(summary.terminal, 1);
    assert_eq!(client.uploads.load(Ordering::SeqCst), 1);

    let order = OrderRepo::find_by_id(&pool, order_id).await.unwrap().unwrap();
    assert_eq!(order.state, "TRACKING_FAILED");

    let history = TransitionRepo::list_for_entity(&pool, "order", order_id, 10)
        .await
        .unwrap();
    assert_eq!(history[0].reason_code.as_deref(), Some("TRACKING_REJECTED"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_fulfillment_skips_without_consuming_attempts(pool: PgPool) {
    let config = MemoryConfig::fast_retries();
    let client = MockOrders::new(UploadMode::Ok);
    let order = orders::ingest_sale(
        &pool,
        &config,
        &CreateOrder {
            ebay_order_key: "ORDER-7".to_string(),
            candidate_id: None,
            sale_price_usd: dec!(75),
        },
        "test",
    )
    .await
    .unwrap();
    // Force the shipped state without a fulfillment row.
    OrderRepo::update_state(&pool, order.id, "SHIPPED_INTL")
        .await
        .unwrap();

    let summary = tracking::run_tracking_pass(&pool, &config, &client, "worker")
        .await
        .unwrap();
    assert_eq!(summary.skipped_no_fulfillment, 1);
    assert_eq!(client.uploads.load(Ordering::SeqCst), 0);

    let unchanged = OrderRepo::find_by_id(&pool, order.id).await.unwrap().unwrap();
    assert_eq!(unchanged.tracking_attempts, 0);
    assert_eq!(unchanged.state, "SHIPPED_INTL");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn paused_system_refuses_order_mutations_and_passes(pool: PgPool) {
    let config = MemoryConfig::fast_retries();
    let client = MockOrders::new(UploadMode::Ok);
    config.set("system.paused", "true").await.unwrap();

    let err = orders::ingest_sale(
        &pool,
        &config,
        &CreateOrder {
            ebay_order_key: "ORDER-8".to_string(),
            candidate_id: None,
            sale_price_usd: dec!(10),
        },
        "test",
    )
    .await
    .unwrap_err();
    assert!(err.is_paused());

    let err = tracking::run_tracking_pass(&pool, &config, &client, "worker")
        .await
        .unwrap_err();
    assert!(err.is_paused());
    assert_eq!(client.uploads.load(Ordering::SeqCst), 0);
}
