//! HTTP server rendering pages on demand
//!
//! Published pages are cached and regenerated once older than their
//! revalidate interval. Requests carrying a preview cookie always render
//! fresh from the preview reference and never touch the cache.

mod error;

pub use error::{AppError, AppResult};

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, Request, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cache::PageCache;
use crate::cms::ContentSource;
use crate::config::SiteConfig;
use crate::generator::Generator;
use crate::helpers::{is_safe_uid, listing_url, post_url, url_for};
use crate::pages;
use crate::preview::{self, PreviewSession};
use crate::Blog;

/// Server state
struct ServerState {
    config: SiteConfig,
    source: Arc<dyn ContentSource>,
    generator: Generator,
    cache: PageCache,
    public_dir: PathBuf,
}

impl ServerState {
    fn new(blog: &Blog) -> Result<Self> {
        Ok(Self {
            config: blog.config.clone(),
            source: blog.source.clone(),
            generator: Generator::new(&blog.config, &blog.i18n)?,
            cache: PageCache::new(),
            public_dir: blog.public_dir.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct PreviewParams {
    token: Option<String>,
    #[serde(rename = "documentId")]
    document_id: Option<String>,
}

/// Build the application router for `blog`
pub fn router(blog: &Blog) -> Result<Router> {
    let state = Arc::new(ServerState::new(blog)?);
    Ok(build_router(state))
}

fn build_router(state: Arc<ServerState>) -> Router {
    let root = state.config.root.trim_matches('/').to_string();

    let routes = Router::new()
        .route("/", get(index_handler))
        .route("/page/:n", get(listing_handler))
        .route("/page/:n/", get(listing_handler))
        .route("/post/:slug", get(post_handler))
        .route("/post/:slug/", get(post_handler))
        .route("/api/preview", get(preview_handler))
        .route("/api/exit-preview", get(exit_preview_handler))
        .fallback(fallback_handler)
        .with_state(state);

    let app = if root.is_empty() {
        routes
    } else {
        Router::new().nest(&format!("/{}", root), routes)
    };

    app.layer(TraceLayer::new_for_http())
}

/// Start the server
pub async fn start(blog: &Blog, ip: &str, port: u16) -> Result<()> {
    let state = Arc::new(ServerState::new(blog)?);
    prerender(&state).await;

    let app = build_router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Fill the cache with the first listing pages and their posts
async fn prerender(state: &ServerState) {
    let session = PreviewSession::published();

    for page_count in 1..=state.config.prerender_pages {
        match render_listing(state, &session, page_count).await {
            Ok(Some(html)) => {
                state
                    .cache
                    .insert(&listing_url(&state.config, page_count), html)
                    .await
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Failed to prerender listing page {}: {}", page_count, e);
                break;
            }
        }
    }

    let uids = match pages::static_paths(state.source.as_ref(), &state.config).await {
        Ok(uids) => uids,
        Err(e) => {
            tracing::warn!("Failed to list posts to prerender: {}", e);
            return;
        }
    };

    let mut count = 0;
    for uid in uids.into_iter().filter(|uid| is_safe_uid(uid)) {
        match render_post(state, &session, &uid).await {
            Ok(Some(html)) => {
                state.cache.insert(&post_url(&state.config, &uid), html).await;
                count += 1;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to prerender post {}: {}", uid, e),
        }
    }
    tracing::info!("Prerendered {} posts", count);
}

async fn index_handler(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let session = PreviewSession::from_headers(&headers);
    listing_page(&state, &session, 1).await
}

async fn listing_handler(
    State(state): State<Arc<ServerState>>,
    Path(n): Path<String>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let session = PreviewSession::from_headers(&headers);
    match n.parse::<usize>() {
        Ok(page_count) if page_count >= 1 => listing_page(&state, &session, page_count).await,
        _ => not_found(&state, &session),
    }
}

async fn listing_page(
    state: &ServerState,
    session: &PreviewSession,
    page_count: usize,
) -> AppResult<Response> {
    let key = listing_url(&state.config, page_count);
    let ttl = state.config.revalidate.listing_ttl();
    cached_page(state, session, &key, ttl, || {
        render_listing(state, session, page_count)
    })
    .await
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let session = PreviewSession::from_headers(&headers);
    if !is_safe_uid(&slug) {
        return not_found(&state, &session);
    }
    let key = post_url(&state.config, &slug);
    let ttl = state.config.revalidate.post_ttl();
    cached_page(&state, &session, &key, ttl, || {
        render_post(&state, &session, &slug)
    })
    .await
}

/// Enter preview mode and redirect to the previewed document
async fn preview_handler(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<PreviewParams>,
) -> AppResult<Response> {
    let token = params
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("missing preview token".to_string()))?;

    let session = PreviewSession::with_reference(token.as_str());
    let location = pages::preview_redirect(
        state.source.as_ref(),
        &state.config,
        &session,
        params.document_id.as_deref(),
    )
    .await?;

    tracing::info!("Entering preview mode, redirecting to {}", location);
    Ok((
        [(header::SET_COOKIE, preview::set_cookie(&token))],
        Redirect::temporary(&location),
    )
        .into_response())
}

/// Leave preview mode; the cookie is cleared whether or not it was set
async fn exit_preview_handler(State(state): State<Arc<ServerState>>) -> Response {
    (
        [(header::SET_COOKIE, preview::clear_cookie())],
        Redirect::temporary(&url_for(&state.config, "/")),
    )
        .into_response()
}

/// Serve generated and static files, or the not-found page
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> AppResult<Response> {
    let session = PreviewSession::from_headers(request.headers());

    let mut service = ServeDir::new(&state.public_dir).append_index_html_on_directories(true);
    let response = service.try_call(request).await?;
    if response.status() == StatusCode::NOT_FOUND {
        return not_found(&state, &session);
    }
    Ok(response.into_response())
}

/// Serve a page from the cache, or render it directly in preview mode
async fn cached_page<F, Fut>(
    state: &ServerState,
    session: &PreviewSession,
    key: &str,
    ttl: Duration,
    render: F,
) -> AppResult<Response>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = AppResult<Option<String>>>,
{
    let html = if session.is_active() {
        render().await?
    } else {
        state.cache.get_or_render(key, ttl, render).await?
    };

    match html {
        Some(html) => Ok(Html(html).into_response()),
        None => not_found(state, session),
    }
}

/// Render the listing with its first `page_count` pages; `None` past the end
async fn render_listing(
    state: &ServerState,
    session: &PreviewSession,
    page_count: usize,
) -> AppResult<Option<String>> {
    let listing =
        pages::load_listing(state.source.as_ref(), &state.config, session, page_count).await?;
    if listing.pages_loaded() < page_count && !listing.can_load_more() {
        return Ok(None);
    }
    Ok(Some(state.generator.render_listing(&listing, session)?))
}

async fn render_post(
    state: &ServerState,
    session: &PreviewSession,
    uid: &str,
) -> AppResult<Option<String>> {
    let Some(page) = pages::load_post(state.source.as_ref(), &state.config, session, uid).await?
    else {
        return Ok(None);
    };
    Ok(Some(state.generator.render_post(&page, session)?))
}

fn not_found(state: &ServerState, session: &PreviewSession) -> AppResult<Response> {
    let html = state.generator.render_not_found(session)?;
    Ok((StatusCode::NOT_FOUND, Html(html)).into_response())
}
