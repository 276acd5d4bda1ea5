//! Shared fixtures for unit tests

use serde_json::json;

use crate::cms::{Document, MemorySource};

/// A `posts` document with two short sections
pub fn post_document(id: &str, uid: &str, published: &str) -> Document {
    Document {
        id: id.to_string(),
        uid: Some(uid.to_string()),
        doc_type: "posts".to_string(),
        first_publication_date: Some(published.to_string()),
        last_publication_date: Some(published.to_string()),
        data: json!({
            "title": format!("Post {}", uid),
            "subtitle": format!("About {}", uid),
            "author": "Joseph Oliveira",
            "banner": {"url": format!("https://images.example.com/{}.png", uid)},
            "content": [
                {
                    "heading": "Introduction",
                    "body": [
                        {"type": "paragraph", "text": "Lorem ipsum dolor sit amet.", "spans": []}
                    ]
                },
                {
                    "heading": "Wrapping up",
                    "body": [
                        {"type": "paragraph", "text": "Consectetur adipiscing elit.", "spans": [
                            {"start": 0, "end": 11, "type": "strong"}
                        ]}
                    ]
                }
            ]
        }),
    }
}

/// Three posts published on 1, 10 and 20 March 2021
pub fn sample_documents() -> Vec<Document> {
    vec![
        post_document("p1", "first-post", "2021-03-01T10:00:00+0000"),
        post_document("p2", "second-post", "2021-03-10T10:00:00+0000"),
        post_document("p3", "third-post", "2021-03-20T10:00:00+0000"),
    ]
}

pub fn sample_source() -> MemorySource {
    MemorySource::new(sample_documents())
}
