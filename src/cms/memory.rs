//! In-memory content source
//!
//! Serves documents from a JSON fixture file so the blog can be developed
//! and tested without a remote repository. Pagination URLs have the form
//! `memory://search?q=<query>&page=P`, where `<query>` is the whole query
//! as percent-encoded JSON, so following one needs no server-side state.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use std::cmp::Ordering as CmpOrdering;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use super::document::{Document, SearchResponse};
use super::query::Query;
use super::{CmsError, ContentSource, FIRST_PUBLICATION_DATE};

const PAGE_URL_PREFIX: &str = "memory://search";
const DEFAULT_PAGE_SIZE: usize = 20;
const DEFAULT_MASTER_REF: &str = "master";
/// How many query references [`MemorySource::references`] remembers
const RECORDED_REFERENCES: usize = 256;

#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default = "default_master_ref")]
    master_ref: String,
    #[serde(default)]
    documents: Vec<Document>,
    /// Draft documents keyed by preview reference
    #[serde(default)]
    drafts: HashMap<String, Vec<Document>>,
}

fn default_master_ref() -> String {
    DEFAULT_MASTER_REF.to_string()
}

/// Content source backed by a list of documents
pub struct MemorySource {
    master_ref: String,
    documents: Vec<Document>,
    drafts: HashMap<String, Vec<Document>>,
    references: Mutex<VecDeque<Option<String>>>,
}

impl MemorySource {
    /// Create a source holding the given published documents
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            master_ref: default_master_ref(),
            documents,
            drafts: HashMap::new(),
            references: Mutex::new(VecDeque::new()),
        }
    }

    /// Add a draft visible only under the given preview reference
    pub fn with_draft(mut self, reference: impl Into<String>, document: Document) -> Self {
        self.drafts.entry(reference.into()).or_default().push(document);
        self
    }

    /// Parse a fixture (`{"master_ref", "documents", "drafts"}`)
    pub fn from_json(json: &str) -> Result<Self, CmsError> {
        let fixture: Fixture = serde_json::from_str(json)?;
        Ok(Self {
            master_ref: fixture.master_ref,
            documents: fixture.documents,
            drafts: fixture.drafts,
            references: Mutex::new(VecDeque::new()),
        })
    }

    /// Load a fixture file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CmsError> {
        let content = fs::read_to_string(path.as_ref())?;
        let source = Self::from_json(&content)?;
        tracing::debug!(
            "Loaded {} documents from {:?}",
            source.documents.len(),
            path.as_ref()
        );
        Ok(source)
    }

    /// References passed with the most recent queries, oldest first
    pub fn references(&self) -> Vec<Option<String>> {
        self.references
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    fn record_reference(&self, reference: Option<String>) {
        let mut references = self.references.lock().unwrap_or_else(PoisonError::into_inner);
        if references.len() == RECORDED_REFERENCES {
            references.pop_front();
        }
        references.push_back(reference);
    }

    /// Published documents with the drafts of `reference` laid over them
    fn snapshot(&self, reference: Option<&str>) -> Vec<Document> {
        let mut docs = self.documents.clone();
        let drafts = reference
            .filter(|r| *r != self.master_ref)
            .and_then(|r| self.drafts.get(r));

        if let Some(drafts) = drafts {
            for draft in drafts {
                match docs.iter_mut().find(|d| d.id == draft.id) {
                    Some(existing) => *existing = draft.clone(),
                    None => docs.push(draft.clone()),
                }
            }
        }
        docs
    }

    fn run(&self, query: &Query, page: u32) -> Result<SearchResponse, CmsError> {
        let mut docs: Vec<Document> = self
            .snapshot(query.reference.as_deref())
            .into_iter()
            .filter(|d| {
                query
                    .predicates
                    .iter()
                    .all(|p| p.matches(field_value(d, &p.path)))
            })
            .collect();

        docs.sort_by(|a, b| {
            for ordering in &query.orderings {
                let ord = compare_field(a, b, &ordering.field);
                let ord = if ordering.descending { ord.reverse() } else { ord };
                if ord != CmpOrdering::Equal {
                    return ord;
                }
            }
            CmpOrdering::Equal
        });

        if let Some(ref after) = query.after {
            docs = match docs.iter().position(|d| &d.id == after) {
                Some(pos) => docs.split_off(pos + 1),
                None => Vec::new(),
            };
        }

        let per_page = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let total = docs.len();
        let total_pages = total.div_ceil(per_page) as u32;
        let page = page.max(1);

        let results: Vec<Document> = docs
            .into_iter()
            .skip((page as usize - 1) * per_page)
            .take(per_page)
            .map(|d| project(d, &query.fetch))
            .collect();

        let encoded = serde_json::to_string(query)?;
        let encoded = utf8_percent_encode(&encoded, NON_ALPHANUMERIC).to_string();
        let page_url = |n: u32| format!("{}?q={}&page={}", PAGE_URL_PREFIX, encoded, n);

        Ok(SearchResponse {
            page,
            results_per_page: per_page,
            results_size: results.len(),
            total_results_size: total,
            total_pages,
            next_page: (page < total_pages).then(|| page_url(page + 1)),
            prev_page: (page > 1).then(|| page_url(page - 1)),
            results,
        })
    }
}

#[async_trait]
impl ContentSource for MemorySource {
    async fn master_ref(&self) -> Result<String, CmsError> {
        Ok(self.master_ref.clone())
    }

    async fn query(&self, query: &Query) -> Result<SearchResponse, CmsError> {
        self.record_reference(query.reference.clone());
        self.run(query, 1)
    }

    async fn fetch_page(&self, url: &str) -> Result<SearchResponse, CmsError> {
        let invalid = || CmsError::InvalidPageUrl(url.to_string());

        if !url.starts_with(PAGE_URL_PREFIX) {
            return Err(invalid());
        }
        let parsed = reqwest::Url::parse(url).map_err(|_| invalid())?;

        let mut query = None;
        let mut page = None;
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "q" => query = serde_json::from_str::<Query>(&value).ok(),
                "page" => page = value.parse::<u32>().ok(),
                _ => {}
            }
        }
        let (query, page) = query.zip(page).ok_or_else(invalid)?;

        self.record_reference(query.reference.clone());
        self.run(&query, page)
    }
}

/// Resolve a predicate path against a document
fn field_value<'a>(doc: &'a Document, path: &str) -> Option<&'a str> {
    match path {
        "document.type" => Some(doc.doc_type.as_str()),
        "document.id" => Some(doc.id.as_str()),
        _ => {
            let (doc_type, field) = path.strip_prefix("my.")?.split_once('.')?;
            if doc_type != doc.doc_type {
                return None;
            }
            if field == "uid" {
                return doc.uid.as_deref();
            }
            doc.data.get(field)?.as_str()
        }
    }
}

fn compare_field(a: &Document, b: &Document, field: &str) -> CmpOrdering {
    match field {
        FIRST_PUBLICATION_DATE => a.first_published().cmp(&b.first_published()),
        "document.last_publication_date" => a.last_published().cmp(&b.last_published()),
        _ => field_value(a, field).cmp(&field_value(b, field)),
    }
}

/// Keep only the `data` fields named in `fetch` (`type.field` entries)
fn project(mut doc: Document, fetch: &[String]) -> Document {
    if fetch.is_empty() {
        return doc;
    }
    if let serde_json::Value::Object(ref mut map) = doc.data {
        let prefix = format!("{}.", doc.doc_type);
        map.retain(|key, _| {
            fetch
                .iter()
                .any(|f| f.strip_prefix(&prefix) == Some(key.as_str()))
        });
    }
    doc
}
