//! Initialize a new blog

use anyhow::Result;
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# headless-blog configuration

# Site
title: Blog
language: en
logo: /logo.svg

# URL
root: /

# Directory
public_dir: public
i18n_dir: languages

# Content API
api:
  # endpoint: https://your-repository.cdn.prismic.io/api/v2
  # access_token: ''
  fixtures: fixtures.json
  document_type: posts
  timeout: 10

# Listing
page_size: 1
prerender_pages: 1

# Seconds before a cached page is regenerated
revalidate:
  listing: 120
  post: 180

# Comments
# The widget is only shown once repo names the GitHub repository holding
# the comment threads, e.g. repo: owner/blog-comments
comments:
  enable: true
  src: https://utteranc.es/client.js
  repo: ''
  issue_term: pathname
  theme: dark-blue

# Date / Time format
date_format: DD MMM YYYY
time_format: HH:mm
"#;

const SAMPLE_FIXTURES: &str = r#"{
  "master_ref": "master",
  "documents": [
    {
      "id": "hello-world",
      "uid": "hello-world",
      "type": "posts",
      "first_publication_date": "2021-03-15T19:25:28+0000",
      "last_publication_date": "2021-03-15T19:25:28+0000",
      "data": {
        "title": "Hello World",
        "subtitle": "Your first post",
        "author": "Blog Author",
        "banner": { "url": null },
        "content": [
          {
            "heading": "Welcome",
            "body": [
              {
                "type": "paragraph",
                "text": "This post comes from fixtures.json. Point api.endpoint at your content repository to publish real posts.",
                "spans": [{ "start": 21, "end": 34, "type": "strong" }]
              }
            ]
          }
        ]
      }
    }
  ],
  "drafts": {}
}
"#;

/// Initialize a new blog in the given directory
///
/// Existing files are left untouched.
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir)?;

    write_if_missing(&target_dir.join("_config.yml"), DEFAULT_CONFIG)?;
    write_if_missing(&target_dir.join("fixtures.json"), SAMPLE_FIXTURES)?;

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        tracing::warn!("{:?} already exists, skipping", path);
        return Ok(());
    }
    fs::write(path, content)?;
    tracing::debug!("Created: {:?}", path);
    Ok(())
}
