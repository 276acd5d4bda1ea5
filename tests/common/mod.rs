use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::json;
use tempfile::TempDir;
use tower::ServiceExt;

use headless_blog::cms::{CmsError, ContentSource, Document, MemorySource, Query, SearchResponse};
use headless_blog::config::SiteConfig;
use headless_blog::Blog;

pub const PREVIEW_REF: &str = "preview-token";

/// A published post with one short section
pub fn post(id: &str, uid: &str, published: &str) -> Document {
    Document {
        id: id.to_string(),
        uid: Some(uid.to_string()),
        doc_type: "posts".to_string(),
        first_publication_date: Some(published.to_string()),
        last_publication_date: Some(published.to_string()),
        data: json!({
            "title": format!("Title of {}", uid),
            "subtitle": format!("Subtitle of {}", uid),
            "author": "Joseph Oliveira",
            "banner": {"url": format!("https://images.example.com/{}.png", uid)},
            "content": [
                {
                    "heading": "Only section",
                    "body": [{"type": "paragraph", "text": "Short body.", "spans": []}]
                }
            ]
        }),
    }
}

/// Three posts, plus a draft of the second one under [`PREVIEW_REF`]
pub fn test_source() -> Arc<MemorySource> {
    let mut draft = post("p2", "second-post", "2021-03-10T10:00:00+0000");
    draft.data["title"] = json!("Draft title");

    Arc::new(
        MemorySource::new(vec![
            post("p1", "first-post", "2021-03-01T10:00:00+0000"),
            post("p2", "second-post", "2021-03-10T10:00:00+0000"),
            post("p3", "third-post", "2021-03-20T10:00:00+0000"),
        ])
        .with_draft(PREVIEW_REF, draft),
    )
}

/// Fixture source whose `next_page` fetches can be switched to fail,
/// like an API that goes down after the first pages were served
pub struct FlakySource {
    inner: Arc<MemorySource>,
    failing: AtomicBool,
}

impl FlakySource {
    pub fn new(inner: Arc<MemorySource>) -> Self {
        Self {
            inner,
            failing: AtomicBool::new(false),
        }
    }

    pub fn fail_page_fetches(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContentSource for FlakySource {
    async fn master_ref(&self) -> Result<String, CmsError> {
        self.inner.master_ref().await
    }

    async fn query(&self, query: &Query) -> Result<SearchResponse, CmsError> {
        self.inner.query(query).await
    }

    async fn fetch_page(&self, url: &str) -> Result<SearchResponse, CmsError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CmsError::Api {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }
        self.inner.fetch_page(url).await
    }
}

/// A router over `source` with the default config
pub fn build_test_app(source: Arc<MemorySource>) -> (Router, TempDir) {
    build_app_with(SiteConfig::default(), source)
}

/// A router over `source`, serving static files from a temporary public dir
pub fn build_app_with(config: SiteConfig, source: Arc<dyn ContentSource>) -> (Router, TempDir) {
    let tmp = TempDir::new().unwrap();
    let blog = Blog::with_source(tmp.path(), config, source).unwrap();
    std::fs::create_dir_all(&blog.public_dir).unwrap();

    let app = headless_blog::server::router(&blog).unwrap();
    (app, tmp)
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get_with_cookie(app: Router, uri: &str, cookie: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
