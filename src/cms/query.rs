//! Search query builder

use serde::{Deserialize, Serialize};

use super::predicate::{render_orderings, render_predicates, Ordering, Predicate};

/// A search against the content API
///
/// `reference` selects the content snapshot. `None` means the published
/// (master) reference; a preview token selects draft content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    pub predicates: Vec<Predicate>,
    pub fetch: Vec<String>,
    pub page_size: Option<usize>,
    pub orderings: Vec<Ordering>,
    pub after: Option<String>,
    pub reference: Option<String>,
}

impl Query {
    pub fn new(predicates: Vec<Predicate>) -> Self {
        Self {
            predicates,
            ..Default::default()
        }
    }

    /// Restrict the returned `data` to the given `type.field` entries
    pub fn fetch<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fetch = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn order_by(mut self, ordering: Ordering) -> Self {
        self.orderings.push(ordering);
        self
    }

    /// Only return documents positioned after the given document id
    pub fn after(mut self, id: impl Into<String>) -> Self {
        self.after = Some(id.into());
        self
    }

    pub fn reference(mut self, reference: Option<String>) -> Self {
        self.reference = reference;
        self
    }

    /// Query-string parameters, excluding `ref` and the access token
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("q", render_predicates(&self.predicates))];
        if let Some(size) = self.page_size {
            params.push(("pageSize", size.to_string()));
        }
        if !self.fetch.is_empty() {
            params.push(("fetch", self.fetch.join(",")));
        }
        if !self.orderings.is_empty() {
            params.push(("orderings", render_orderings(&self.orderings)));
        }
        if let Some(ref after) = self.after {
            params.push(("after", after.clone()));
        }
        params
    }
}
