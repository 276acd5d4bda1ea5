//! Page data loading
//!
//! Each loader fetches what one page needs from the content source. The
//! preview session is passed in explicitly and decides which content
//! reference every query targets.

use serde::Serialize;

use crate::cms::{
    CmsError, ContentSource, Ordering, Predicate, Query, FIRST_PUBLICATION_DATE,
};
use crate::config::SiteConfig;
use crate::content::{reading_time, resolve_neighbors, Cursor, Listing, Neighbors, PostDetail};
use crate::helpers::{post_url, url_for};
use crate::preview::PreviewSession;

/// Everything the post detail page renders
#[derive(Debug, Clone, Serialize)]
pub struct PostPage {
    pub post: PostDetail,
    pub reading_time: u32,
    pub neighbors: Neighbors,
}

fn posts_query(config: &SiteConfig, session: &PreviewSession) -> Query {
    Query::new(vec![Predicate::at(
        "document.type",
        config.api.document_type.as_str(),
    )])
    .page_size(config.listing_page_size())
    .order_by(Ordering::desc(FIRST_PUBLICATION_DATE))
    .reference(session.reference().map(str::to_string))
}

/// Load the listing with up to `pages` pages of posts, newest first.
///
/// Fails if any of the wanted pages cannot be fetched while the API still
/// reports more, so a partial listing is never rendered as complete.
pub async fn load_listing(
    source: &dyn ContentSource,
    config: &SiteConfig,
    session: &PreviewSession,
    pages: usize,
) -> Result<Listing, CmsError> {
    let doc_type = &config.api.document_type;
    let query = posts_query(config, session).fetch([
        format!("{}.title", doc_type),
        format!("{}.subtitle", doc_type),
        format!("{}.author", doc_type),
    ]);

    let first = source.query(&query).await?;
    let mut listing = Listing::new(Cursor::from_response(&first));

    if let Err(e) = listing.load_pages(source, pages).await {
        tracing::warn!(
            loaded = listing.pages_loaded(),
            wanted = pages,
            "Failed to load more posts: {}",
            e
        );
        return Err(e);
    }

    Ok(listing)
}

/// Load a post with its reading time and neighbors; `None` if no post has `uid`
pub async fn load_post(
    source: &dyn ContentSource,
    config: &SiteConfig,
    session: &PreviewSession,
    uid: &str,
) -> Result<Option<PostPage>, CmsError> {
    let doc_type = &config.api.document_type;
    let Some(doc) = source.get_by_uid(doc_type, uid, session.reference()).await? else {
        return Ok(None);
    };

    let post = PostDetail::from_document(&doc);
    let neighbors = resolve_neighbors(source, doc_type, &post.id, session.reference()).await?;
    let reading_time = reading_time(&post.content);

    Ok(Some(PostPage {
        post,
        reading_time,
        neighbors,
    }))
}

/// Uids of the posts to prerender, from the first `prerender_pages` pages
pub async fn static_paths(
    source: &dyn ContentSource,
    config: &SiteConfig,
) -> Result<Vec<String>, CmsError> {
    let query = posts_query(config, &PreviewSession::published())
        .fetch([format!("{}.title", config.api.document_type)]);

    let first = source.query(&query).await?;
    let mut listing = Listing::new(Cursor::from_response(&first));
    listing.load_pages(source, config.prerender_pages).await?;

    Ok(listing.results().iter().map(|p| p.uid.clone()).collect())
}

/// Where to send an editor entering preview for `document_id`
pub async fn preview_redirect(
    source: &dyn ContentSource,
    config: &SiteConfig,
    session: &PreviewSession,
    document_id: Option<&str>,
) -> Result<String, CmsError> {
    let home = url_for(config, "/");
    let Some(id) = document_id else {
        return Ok(home);
    };

    let doc = source.get_by_id(id, session.reference()).await?;
    Ok(match doc {
        Some(doc) if doc.doc_type == config.api.document_type => match doc.uid {
            Some(uid) => post_url(config, &uid),
            None => home,
        },
        _ => home,
    })
}
