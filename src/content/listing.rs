//! Listing state and incremental "load more"
//!
//! A [`Listing`] owns the posts shown so far and the URL of the next page.
//! Every change goes through [`Listing::apply`], which appends a fetched
//! page after the existing results. Loading takes `&mut self`, so two loads
//! on the same listing can never overlap.

use serde::Serialize;

use super::post::PostSummary;
use crate::cms::{CmsError, ContentSource, SearchResponse};

/// Pagination cursor: the posts loaded so far and the next page, if any
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Cursor {
    /// `None` iff no further page exists
    pub next_page: Option<String>,
    pub results: Vec<PostSummary>,
}

impl Cursor {
    pub fn from_response(response: &SearchResponse) -> Self {
        Self {
            next_page: response.next_page.clone(),
            results: response
                .results
                .iter()
                .map(PostSummary::from_document)
                .collect(),
        }
    }
}

/// Client-held listing state
#[derive(Debug, Clone)]
pub struct Listing {
    cursor: Cursor,
    pages_loaded: usize,
}

impl Listing {
    /// Start from the first page
    pub fn new(cursor: Cursor) -> Self {
        Self {
            cursor,
            pages_loaded: 1,
        }
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn results(&self) -> &[PostSummary] {
        &self.cursor.results
    }

    pub fn next_page(&self) -> Option<&str> {
        self.cursor.next_page.as_deref()
    }

    pub fn pages_loaded(&self) -> usize {
        self.pages_loaded
    }

    /// Whether the "load more" control should be offered
    pub fn can_load_more(&self) -> bool {
        self.cursor.next_page.is_some()
    }

    /// Append a fetched page. Results are not de-duplicated.
    pub fn apply(&mut self, page: Cursor) {
        self.cursor.results.extend(page.results);
        self.cursor.next_page = page.next_page;
        self.pages_loaded += 1;
    }

    /// Fetch the next page and append it.
    ///
    /// Returns `Ok(false)` when there is nothing left to load. On error the
    /// state is left untouched.
    pub async fn load_more(&mut self, source: &dyn ContentSource) -> Result<bool, CmsError> {
        let Some(url) = self.cursor.next_page.clone() else {
            return Ok(false);
        };

        let response = source.fetch_page(&url).await?;
        self.apply(Cursor::from_response(&response));
        tracing::debug!(
            pages = self.pages_loaded,
            posts = self.cursor.results.len(),
            "Loaded more posts"
        );
        Ok(true)
    }

    /// Keep loading until `pages` pages are loaded or none remain
    pub async fn load_pages(
        &mut self,
        source: &dyn ContentSource,
        pages: usize,
    ) -> Result<(), CmsError> {
        while self.pages_loaded < pages && self.load_more(source).await? {}
        Ok(())
    }

    pub fn into_cursor(self) -> Cursor {
        self.cursor
    }
}
