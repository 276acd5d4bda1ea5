//! REST client for the remote content API
//!
//! Wraps the v2 document API (`GET {endpoint}` for refs and
//! `GET {endpoint}/documents/search` for queries) using [`reqwest`].
//! The master ref is remembered for [`MASTER_REF_TTL`] so a page load does
//! not resolve it again for every query.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::document::{ApiInfo, SearchResponse};
use super::query::Query;
use super::{CmsError, ContentSource};
use crate::config::ApiConfig;

/// How long a resolved master ref is reused by queries
pub const MASTER_REF_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
struct CachedRef {
    reference: String,
    fetched_at: Instant,
}

/// HTTP client for a single content repository
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
    master_ref: Arc<RwLock<Option<CachedRef>>>,
}

impl ApiClient {
    /// Create a new client.
    ///
    /// * `endpoint` - API base URL, e.g. `https://repo.cdn.prismic.io/api/v2`.
    pub fn new(endpoint: impl Into<String>, access_token: Option<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint, access_token)
    }

    /// Create a client reusing an existing [`reqwest::Client`]
    pub fn with_client(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        access_token: Option<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            access_token,
            master_ref: Arc::new(RwLock::new(None)),
        }
    }

    /// Build a client from the `api` section of the site config
    pub fn from_config(config: &ApiConfig) -> Result<Self, CmsError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout.max(1)))
            .build()?;
        Ok(Self::with_client(
            client,
            config.endpoint.clone(),
            config.access_token.clone(),
        ))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn token_param(&self) -> Vec<(&'static str, String)> {
        self.access_token
            .iter()
            .map(|t| ("access_token", t.clone()))
            .collect()
    }

    // ---- private helpers ----

    /// The master ref, fetched again once the cached one is older than
    /// [`MASTER_REF_TTL`]
    async fn cached_master_ref(&self) -> Result<String, CmsError> {
        if let Some(cached) = self.master_ref.read().await.as_ref() {
            if cached.fetched_at.elapsed() < MASTER_REF_TTL {
                return Ok(cached.reference.clone());
            }
        }
        self.master_ref().await
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`CmsError::Api`] with the
    /// status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, CmsError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(CmsError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, CmsError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ContentSource for ApiClient {
    async fn master_ref(&self) -> Result<String, CmsError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&self.token_param())
            .send()
            .await?;

        let info: ApiInfo = Self::parse_response(response).await?;
        let reference = info
            .master_ref()
            .map(|r| r.reference.clone())
            .ok_or(CmsError::NoMasterRef)?;

        tracing::debug!(reference = %reference, "Resolved master ref");
        *self.master_ref.write().await = Some(CachedRef {
            reference: reference.clone(),
            fetched_at: Instant::now(),
        });
        Ok(reference)
    }

    async fn query(&self, query: &Query) -> Result<SearchResponse, CmsError> {
        let reference = match query.reference {
            Some(ref r) => r.clone(),
            None => self.cached_master_ref().await?,
        };

        let mut params = query.to_params();
        params.push(("ref", reference));
        params.extend(self.token_param());

        tracing::debug!(params = ?params, "Querying content API");

        let response = self
            .client
            .get(format!("{}/documents/search", self.endpoint))
            .query(&params)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn fetch_page(&self, url: &str) -> Result<SearchResponse, CmsError> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(CmsError::InvalidPageUrl(url.to_string()));
        }

        tracing::debug!(url, "Fetching next page");
        let response = self.client.get(url).send().await?;
        Self::parse_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::{Ordering, Predicate, FIRST_PUBLICATION_DATE};
    use axum::extract::{Query as Params, State};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::sync::Mutex;

    /// What the local API server has been asked for
    #[derive(Default)]
    struct Requests {
        api_info: AtomicUsize,
        searches: Mutex<Vec<HashMap<String, String>>>,
    }

    async fn api_info(State(requests): State<Arc<Requests>>) -> Json<Value> {
        requests.api_info.fetch_add(1, AtomicOrdering::SeqCst);
        Json(json!({
            "refs": [
                {"id": "draft", "ref": "release-ref", "label": "Next release", "isMasterRef": false},
                {"id": "master", "ref": "master-ref-1", "label": "Master", "isMasterRef": true}
            ]
        }))
    }

    async fn search(
        State(requests): State<Arc<Requests>>,
        Params(params): Params<HashMap<String, String>>,
    ) -> Json<Value> {
        requests.searches.lock().unwrap().push(params);
        Json(json!({
            "page": 1,
            "results_per_page": 1,
            "results_size": 1,
            "total_results_size": 1,
            "total_pages": 1,
            "next_page": null,
            "prev_page": null,
            "results": [{"id": "p1", "uid": "first-post", "type": "posts", "data": {"title": "First"}}]
        }))
    }

    async fn spawn_api(requests: Arc<Requests>) -> String {
        let app = Router::new()
            .route("/api/v2", get(api_info))
            .route("/api/v2/documents/search", get(search))
            .route(
                "/offline/documents/search",
                get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "repository offline") }),
            )
            .route("/norefs", get(|| async { Json(json!({"refs": []})) }))
            .with_state(requests);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn posts_query() -> Query {
        Query::new(vec![Predicate::at("document.type", "posts")])
            .page_size(1)
            .order_by(Ordering::desc(FIRST_PUBLICATION_DATE))
            .after("p2")
    }

    #[tokio::test]
    async fn test_query_sends_params_with_master_ref() {
        let requests = Arc::new(Requests::default());
        let base = spawn_api(requests.clone()).await;
        let client = ApiClient::new(format!("{}/api/v2/", base), Some("secret".to_string()));

        let response = client.query(&posts_query()).await.unwrap();
        assert_eq!(response.results[0].uid.as_deref(), Some("first-post"));

        let searches = requests.searches.lock().unwrap();
        let params = &searches[0];
        assert_eq!(params["ref"], "master-ref-1");
        assert_eq!(params["q"], r#"[[at(document.type, "posts")]]"#);
        assert_eq!(params["pageSize"], "1");
        assert_eq!(params["orderings"], "[document.first_publication_date desc]");
        assert_eq!(params["after"], "p2");
        assert_eq!(params["access_token"], "secret");
    }

    #[tokio::test]
    async fn test_master_ref_is_reused_between_queries() {
        let requests = Arc::new(Requests::default());
        let base = spawn_api(requests.clone()).await;
        let client = ApiClient::new(format!("{}/api/v2", base), None);

        client.query(&posts_query()).await.unwrap();
        client.query(&posts_query()).await.unwrap();
        client
            .get_by_uid("posts", "first-post", None)
            .await
            .unwrap();
        assert_eq!(requests.api_info.load(AtomicOrdering::SeqCst), 1);

        let preview = posts_query().reference(Some("preview-token".to_string()));
        client.query(&preview).await.unwrap();
        assert_eq!(requests.api_info.load(AtomicOrdering::SeqCst), 1);

        let searches = requests.searches.lock().unwrap();
        assert_eq!(searches.len(), 4);
        assert!(!searches[0].contains_key("access_token"));
        assert_eq!(searches[2]["ref"], "master-ref-1");
        assert_eq!(searches[3]["ref"], "preview-token");
    }

    #[tokio::test]
    async fn test_expired_master_ref_is_fetched_again() {
        let requests = Arc::new(Requests::default());
        let base = spawn_api(requests.clone()).await;
        let client = ApiClient::new(format!("{}/api/v2", base), None);

        client.query(&posts_query()).await.unwrap();
        if let Some(cached) = client.master_ref.write().await.as_mut() {
            cached.fetched_at -= MASTER_REF_TTL;
        }
        client.query(&posts_query()).await.unwrap();

        assert_eq!(requests.api_info.load(AtomicOrdering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let base = spawn_api(Arc::new(Requests::default())).await;
        let client = ApiClient::new(format!("{}/offline", base), None);

        let query = posts_query().reference(Some("master-ref-1".to_string()));
        match client.query(&query).await {
            Err(CmsError::Api { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "repository offline");
            }
            other => panic!("expected an API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_master_ref() {
        let base = spawn_api(Arc::new(Requests::default())).await;
        let client = ApiClient::new(format!("{}/norefs", base), None);
        assert!(matches!(
            client.master_ref().await,
            Err(CmsError::NoMasterRef)
        ));
    }

    #[tokio::test]
    async fn test_fetch_page_follows_http_urls() {
        let requests = Arc::new(Requests::default());
        let base = spawn_api(requests.clone()).await;
        let client = ApiClient::new(format!("{}/api/v2", base), None);

        let url = format!("{}/api/v2/documents/search?ref=master-ref-1&page=2", base);
        let response = client.fetch_page(&url).await.unwrap();
        assert_eq!(response.results.len(), 1);
        assert_eq!(requests.searches.lock().unwrap()[0]["page"], "2");
    }

    #[tokio::test]
    async fn test_fetch_page_rejects_other_schemes() {
        let client = ApiClient::new("http://127.0.0.1:9/api/v2", None);
        for url in ["memory://search?q=1&page=2", "file:///etc/passwd", "/api/v2/documents/search"] {
            assert!(matches!(
                client.fetch_page(url).await,
                Err(CmsError::InvalidPageUrl(_))
            ));
        }
    }
}
