//! Chronological neighbors of a post

use serde::Serialize;

use super::post::NeighborRef;
use crate::cms::{
    CmsError, ContentSource, Ordering, Predicate, Query, SearchResponse, FIRST_PUBLICATION_DATE,
};

/// The posts published right before and right after a given post
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Neighbors {
    /// Nearest earlier post
    pub previous: Option<NeighborRef>,
    /// Nearest later post
    pub next: Option<NeighborRef>,
}

/// Find the neighbors of document `id`.
///
/// Both lookups use `id` as the `after` cursor and ask for a single result;
/// only the ordering direction differs. Descending order after the post
/// yields the earlier neighbor, ascending order the later one.
pub async fn resolve_neighbors(
    source: &dyn ContentSource,
    doc_type: &str,
    id: &str,
    reference: Option<&str>,
) -> Result<Neighbors, CmsError> {
    let base = Query::new(vec![Predicate::at("document.type", doc_type)])
        .fetch([format!("{}.title", doc_type)])
        .page_size(1)
        .after(id)
        .reference(reference.map(str::to_string));

    let previous_query = base.clone().order_by(Ordering::desc(FIRST_PUBLICATION_DATE));
    let next_query = base.order_by(Ordering::asc(FIRST_PUBLICATION_DATE));

    let (previous, next) = tokio::try_join!(
        source.query(&previous_query),
        source.query(&next_query)
    )?;

    Ok(Neighbors {
        previous: first_ref(previous),
        next: first_ref(next),
    })
}

fn first_ref(response: SearchResponse) -> Option<NeighborRef> {
    response.results.first().map(NeighborRef::from_document)
}
