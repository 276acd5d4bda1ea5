//! Content API access
//!
//! The blog never writes content; it only queries documents by predicate
//! and follows the opaque `next_page` URLs the API hands back. Two sources
//! implement [`ContentSource`]: [`ApiClient`] talks to the remote REST API
//! and [`MemorySource`] serves documents from a local JSON fixture.

mod client;
mod document;
mod memory;
mod predicate;
mod query;

use async_trait::async_trait;

pub use client::ApiClient;
pub use document::{parse_date, ApiInfo, Document, Ref, SearchResponse};
pub use memory::MemorySource;
pub use predicate::{render_orderings, render_predicates, Ordering, Predicate, PredicateOp};
pub use query::Query;

/// Field ordering posts by their first publication
pub const FIRST_PUBLICATION_DATE: &str = "document.first_publication_date";

/// Errors from the content API layer
#[derive(Debug, thiserror::Error)]
pub enum CmsError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout)
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with a non-2xx status
    #[error("content API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// A document or fixture did not have the expected shape
    #[error("failed to decode content: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("content API did not advertise a master ref")]
    NoMasterRef,

    #[error("invalid page URL: {0}")]
    InvalidPageUrl(String),

    #[error("failed to read fixtures: {0}")]
    Fixture(#[from] std::io::Error),
}

/// A read-only source of content documents
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// The reference of the currently published content
    async fn master_ref(&self) -> Result<String, CmsError>;

    /// Run a predicate query and return the first page of results
    async fn query(&self, query: &Query) -> Result<SearchResponse, CmsError>;

    /// Fetch a page by the opaque `next_page` URL of a previous response
    async fn fetch_page(&self, url: &str) -> Result<SearchResponse, CmsError>;

    /// Look up a single document of `doc_type` by its uid
    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        reference: Option<&str>,
    ) -> Result<Option<Document>, CmsError> {
        let query = Query::new(vec![
            Predicate::at("document.type", doc_type),
            Predicate::at(format!("my.{}.uid", doc_type), uid),
        ])
        .page_size(1)
        .reference(reference.map(str::to_string));
        Ok(self.query(&query).await?.results.into_iter().next())
    }

    /// Look up a single document by its id
    async fn get_by_id(
        &self,
        id: &str,
        reference: Option<&str>,
    ) -> Result<Option<Document>, CmsError> {
        let query = Query::new(vec![Predicate::at("document.id", id)])
            .page_size(1)
            .reference(reference.map(str::to_string));
        Ok(self.query(&query).await?.results.into_iter().next())
    }
}
