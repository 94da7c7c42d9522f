//! Arena backend client for dashboard stats and simulation control.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Response};
use tracing::debug;

use crate::models::{DashboardSnapshot, Denomination};

use super::error::ClientError;
use super::source::StatsSource;
use super::types::{HealthResponse, StatsResponse};

const STATS_PATH: &str = "/dashboard/stats";
const CYCLE_PATH: &str = "/simulate/cycle";

/// Client for the arena backend. One attempt per call, no retries, and no
/// timeout beyond the transport's own.
#[derive(Debug, Clone)]
pub struct StatsClient {
    client: Client,
    base_url: String,
    denomination: Denomination,
}

impl StatsClient {
    /// Create a client against an already resolved base URL.
    pub fn new(base_url: impl Into<String>, denomination: Denomination) -> Result<Self, ClientError> {
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            denomination,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the current dashboard stats.
    pub async fn fetch_snapshot(&self) -> Result<DashboardSnapshot, ClientError> {
        let url = format!("{}{}", self.base_url, STATS_PATH);

        debug!(url = %url, "Fetching dashboard stats");

        let response = self.client.get(&url).send().await?;
        let body = check_status(response).await?.text().await?;

        let payload: StatsResponse = serde_json::from_str(&body)?;
        payload.into_snapshot(self.denomination, Utc::now())
    }

    /// Request one simulation cycle. The response body is ignored.
    pub async fn trigger_cycle(&self) -> Result<(), ClientError> {
        let url = format!("{}{}", self.base_url, CYCLE_PATH);

        debug!(url = %url, "Triggering simulation cycle");

        let response = self.client.post(&url).send().await?;
        check_status(response).await?;

        Ok(())
    }

    /// Query the backend's health route and return its status message.
    pub async fn ping(&self) -> Result<String, ClientError> {
        debug!(url = %self.base_url, "Pinging backend");

        let response = self.client.get(&self.base_url).send().await?;
        let body = check_status(response).await?.text().await?;

        let health: HealthResponse = serde_json::from_str(&body)?;
        Ok(health.status)
    }
}

async fn check_status(response: Response) -> Result<Response, ClientError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status { status, body })
}

#[async_trait]
impl StatsSource for StatsClient {
    async fn fetch_snapshot(&self) -> Result<DashboardSnapshot, ClientError> {
        StatsClient::fetch_snapshot(self).await
    }

    async fn trigger_cycle(&self) -> Result<(), ClientError> {
        StatsClient::trigger_cycle(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ErrorKind;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn stats_router() -> Router {
        Router::new().route(
            STATS_PATH,
            get(|| async {
                Json(json!({
                    "spx_price": 500.0,
                    "total_pnl_usd": 1000,
                    "total_pnl_spx": 2.0,
                    "agents": [
                        {"id": 1, "name": "Alpha_Gen1_101", "status": "active",
                         "pnl_usd": 700, "pnl_spx": 1.4, "balance_usd": 100700, "balance_spx": 201.4,
                         "positions": [{"symbol": "SPY", "qty": 2, "entry": 498.5, "pnl_pct": 0.4}]},
                        {"id": 2, "name": "Beta_Gen1_102", "status": "active",
                         "pnl_usd": 300, "pnl_spx": 0.6, "balance_usd": 100300, "balance_spx": 200.6,
                         "positions": []}
                    ]
                }))
            }),
        )
    }

    #[tokio::test]
    async fn test_fetch_snapshot() {
        let base = serve(stats_router()).await;
        let client = StatsClient::new(format!("{}/", base), Denomination::Usd).unwrap();

        let snapshot = client.fetch_snapshot().await.unwrap();

        assert_eq!(client.base_url(), base);
        assert_eq!(snapshot.total_pnl, dec!(1000));
        assert_eq!(snapshot.agent_count, 2);
        assert_eq!(snapshot.agents[0].name, "Alpha_Gen1_101");
        assert_eq!(snapshot.agents[0].positions[0].symbol, "SPY");
        assert_eq!(snapshot.reference_price, Some(dec!(500)));
    }

    #[tokio::test]
    async fn test_fetch_snapshot_spx() {
        let base = serve(stats_router()).await;
        let client = StatsClient::new(base, Denomination::Spx).unwrap();

        let snapshot = client.fetch_snapshot().await.unwrap();

        assert_eq!(snapshot.denomination, Denomination::Spx);
        assert_eq!(snapshot.total_pnl, dec!(2));
        assert_eq!(snapshot.agents[1].pnl, dec!(0.6));
    }

    #[tokio::test]
    async fn test_non_success_status_is_network_error() {
        let router = Router::new().route(
            STATS_PATH,
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable") }),
        );
        let base = serve(router).await;
        let client = StatsClient::new(base, Denomination::Usd).unwrap();

        let err = client.fetch_snapshot().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Network);
        match err {
            ClientError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "database unavailable");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_payload_is_decode_error() {
        let router = Router::new().route(
            STATS_PATH,
            get(|| async { Json(json!({"total_pnl": 5, "agents": "none"})) }),
        );
        let base = serve(router).await;
        let client = StatsClient::new(base, Denomination::Usd).unwrap();

        let err = client.fetch_snapshot().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = StatsClient::new(format!("http://{}", addr), Denomination::Usd).unwrap();
        let err = client.fetch_snapshot().await.unwrap_err();

        assert!(matches!(err, ClientError::Network(_)));
    }

    #[tokio::test]
    async fn test_trigger_cycle_posts_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            CYCLE_PATH,
            post(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Json(json!({"message": "Market cycle task queued"}))
                }
            }),
        );
        let base = serve(router).await;
        let client = StatsClient::new(base, Denomination::Usd).unwrap();

        assert_ok!(client.trigger_cycle().await);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_trigger_cycle_failure() {
        let router = Router::new().route(
            CYCLE_PATH,
            post(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        );
        let base = serve(router).await;
        let client = StatsClient::new(base, Denomination::Usd).unwrap();

        let err = assert_err!(client.trigger_cycle().await);
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[tokio::test]
    async fn test_ping() {
        let router = Router::new().route(
            "/",
            get(|| async { Json(json!({"status": "Agent Arena API is running"})) }),
        );
        let base = serve(router).await;
        let client = StatsClient::new(base, Denomination::Usd).unwrap();

        assert_eq!(client.ping().await.unwrap(), "Agent Arena API is running");
    }
}
