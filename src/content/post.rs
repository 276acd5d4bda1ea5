//! Post models built from content API documents
//!
//! Conversion never fails: absent or malformed fields fall back to empty
//! values so a half-filled draft still renders.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

use super::richtext::{as_text, RichTextBlock};
use crate::cms::Document;

/// A post as shown on the listing page
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PostSummary {
    pub id: String,
    pub uid: String,
    pub first_publication_date: Option<DateTime<FixedOffset>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

impl PostSummary {
    pub fn from_document(doc: &Document) -> Self {
        let fields: SummaryFields = decode(doc);
        Self {
            id: doc.id.clone(),
            uid: doc_uid(doc),
            first_publication_date: doc.first_published(),
            title: fields.title,
            subtitle: fields.subtitle,
            author: fields.author,
        }
    }
}

/// A full post with its content sections
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PostDetail {
    pub id: String,
    pub uid: String,
    pub first_publication_date: Option<DateTime<FixedOffset>>,
    pub last_publication_date: Option<DateTime<FixedOffset>>,
    pub title: String,
    pub banner_url: Option<String>,
    pub author: String,
    pub content: Vec<Section>,
}

impl PostDetail {
    pub fn from_document(doc: &Document) -> Self {
        let fields: DetailFields = decode(doc);
        Self {
            id: doc.id.clone(),
            uid: doc_uid(doc),
            first_publication_date: doc.first_published(),
            last_publication_date: doc.last_published(),
            title: fields.title,
            banner_url: fields.banner.and_then(|b| b.url).filter(|u| !u.is_empty()),
            author: fields.author,
            content: fields
                .content
                .into_iter()
                .map(|s| Section {
                    heading: s.heading,
                    body: s.body,
                })
                .collect(),
        }
    }

    /// Whether the post changed after its first publication
    pub fn was_edited(&self) -> bool {
        match (self.first_publication_date, self.last_publication_date) {
            (Some(first), Some(last)) => last > first,
            _ => false,
        }
    }
}

/// A titled group of body blocks
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Section {
    pub heading: String,
    pub body: Vec<RichTextBlock>,
}

/// Link to an adjacent post
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NeighborRef {
    pub uid: String,
    pub title: String,
}

impl NeighborRef {
    pub fn from_document(doc: &Document) -> Self {
        let fields: SummaryFields = decode(doc);
        Self {
            uid: doc_uid(doc),
            title: fields.title,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SummaryFields {
    #[serde(deserialize_with = "text_field")]
    title: String,
    #[serde(deserialize_with = "text_field")]
    subtitle: String,
    #[serde(deserialize_with = "text_field")]
    author: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DetailFields {
    #[serde(deserialize_with = "text_field")]
    title: String,
    banner: Option<ImageField>,
    #[serde(deserialize_with = "text_field")]
    author: String,
    #[serde(deserialize_with = "nullable")]
    content: Vec<SectionFields>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImageField {
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SectionFields {
    #[serde(deserialize_with = "text_field")]
    heading: String,
    #[serde(deserialize_with = "nullable")]
    body: Vec<RichTextBlock>,
}

/// Decode `data`, logging and falling back to defaults on a shape mismatch
fn decode<T: serde::de::DeserializeOwned + Default>(doc: &Document) -> T {
    if doc.data.is_null() {
        return T::default();
    }
    doc.parse_data().unwrap_or_else(|e| {
        tracing::warn!(id = %doc.id, "Unexpected document shape: {}", e);
        T::default()
    })
}

fn doc_uid(doc: &Document) -> String {
    doc.uid.clone().unwrap_or_else(|| doc.id.clone())
}

/// Accept a key text field as a plain string, a rich text array or null
fn text_field<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextField {
        Plain(String),
        Rich(Vec<RichTextBlock>),
    }

    Ok(match Option::<TextField>::deserialize(deserializer)? {
        Some(TextField::Plain(s)) => s,
        Some(TextField::Rich(blocks)) => as_text(&blocks),
        None => String::new(),
    })
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data::post_document;
    use serde_json::json;

    #[test]
    fn test_summary_from_document() {
        let doc = post_document("p1", "first-post", "2021-03-01T10:00:00+0000");
        let summary = PostSummary::from_document(&doc);
        assert_eq!(summary.uid, "first-post");
        assert_eq!(summary.title, "Post first-post");
        assert_eq!(summary.subtitle, "About first-post");
        assert_eq!(summary.author, "Joseph Oliveira");
        assert!(summary.first_publication_date.is_some());
    }

    #[test]
    fn test_detail_from_document() {
        let doc = post_document("p1", "first-post", "2021-03-01T10:00:00+0000");
        let post = PostDetail::from_document(&doc);
        assert_eq!(post.content.len(), 2);
        assert_eq!(post.content[0].heading, "Introduction");
        assert_eq!(
            post.banner_url.as_deref(),
            Some("https://images.example.com/first-post.png")
        );
        assert!(!post.was_edited());
    }

    #[test]
    fn test_missing_fields_coalesce() {
        let doc = Document {
            id: "x".to_string(),
            uid: None,
            doc_type: "posts".to_string(),
            first_publication_date: None,
            last_publication_date: None,
            data: json!({"title": null, "content": null, "banner": {}}),
        };
        let post = PostDetail::from_document(&doc);
        assert_eq!(post.uid, "x");
        assert_eq!(post.title, "");
        assert!(post.banner_url.is_none());
        assert!(post.content.is_empty());
        assert!(post.first_publication_date.is_none());
    }

    #[test]
    fn test_malformed_data_falls_back() {
        let doc = Document {
            id: "x".to_string(),
            uid: Some("x".to_string()),
            doc_type: "posts".to_string(),
            first_publication_date: None,
            last_publication_date: None,
            data: json!({"content": "not a list"}),
        };
        let post = PostDetail::from_document(&doc);
        assert!(post.content.is_empty());
    }

    #[test]
    fn test_rich_text_title() {
        let mut doc = post_document("p1", "first-post", "2021-03-01T10:00:00+0000");
        doc.data["title"] = json!([{"type": "heading1", "text": "Rich title", "spans": []}]);
        assert_eq!(PostSummary::from_document(&doc).title, "Rich title");
        assert_eq!(NeighborRef::from_document(&doc).title, "Rich title");
    }

    #[test]
    fn test_was_edited() {
        let mut doc = post_document("p1", "first-post", "2021-03-01T10:00:00+0000");
        doc.last_publication_date = Some("2021-03-19T15:49:00+0000".to_string());
        assert!(PostDetail::from_document(&doc).was_edited());
    }
}
