//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub language: String,
    pub logo: String,

    // URL
    pub root: String,

    // Directory
    pub public_dir: String,
    pub i18n_dir: String,

    // Content API
    #[serde(default)]
    pub api: ApiConfig,

    // Listing
    pub page_size: usize,
    pub prerender_pages: usize,

    // Regeneration intervals
    #[serde(default)]
    pub revalidate: RevalidateConfig,

    // Comments widget
    #[serde(default)]
    pub comments: CommentsConfig,

    // Date / Time format
    pub date_format: String,
    pub time_format: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Blog".to_string(),
            language: "en".to_string(),
            logo: "/logo.svg".to_string(),

            root: "/".to_string(),

            public_dir: "public".to_string(),
            i18n_dir: "languages".to_string(),

            api: ApiConfig::default(),

            page_size: 1,
            prerender_pages: 1,

            revalidate: RevalidateConfig::default(),

            comments: CommentsConfig::default(),

            date_format: "DD MMM YYYY".to_string(),
            time_format: "HH:mm".to_string(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Page size used for listing queries, never zero
    pub fn listing_page_size(&self) -> usize {
        self.page_size.max(1)
    }
}

/// Content API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base endpoint, e.g. `https://my-repo.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub access_token: Option<String>,
    /// Local JSON fixture file used instead of the remote API
    pub fixtures: Option<String>,
    /// Custom type holding the blog posts
    pub document_type: String,
    /// Request timeout in seconds
    pub timeout: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_token: None,
            fixtures: None,
            document_type: "posts".to_string(),
            timeout: 10,
        }
    }
}

/// Minimum interval between regenerations of a cached page, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RevalidateConfig {
    pub listing: u64,
    pub post: u64,
}

impl Default for RevalidateConfig {
    fn default() -> Self {
        Self {
            listing: 120,
            post: 180,
        }
    }
}

impl RevalidateConfig {
    pub fn listing_ttl(&self) -> Duration {
        Duration::from_secs(self.listing)
    }

    pub fn post_ttl(&self) -> Duration {
        Duration::from_secs(self.post)
    }
}

/// Third-party comment widget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentsConfig {
    pub enable: bool,
    pub src: String,
    /// Repository holding the comment threads (`owner/name`); the widget
    /// is only embedded once this is set
    pub repo: String,
    pub issue_term: String,
    pub theme: String,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            enable: true,
            src: "https://utteranc.es/client.js".to_string(),
            repo: String::new(),
            issue_term: "pathname".to_string(),
            theme: "dark-blue".to_string(),
        }
    }
}

impl CommentsConfig {
    /// Whether post pages embed the widget
    pub fn is_active(&self) -> bool {
        self.enable && !self.repo.trim().is_empty()
    }

    /// Enabled but unusable because no repository is set
    pub fn is_missing_repo(&self) -> bool {
        self.enable && self.repo.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.title, "Blog");
        assert_eq!(config.page_size, 1);
        assert_eq!(config.api.document_type, "posts");
        assert_eq!(config.revalidate.listing_ttl(), Duration::from_secs(120));
        assert_eq!(config.revalidate.post_ttl(), Duration::from_secs(180));
        assert_eq!(config.comments.issue_term, "pathname");
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: Space Traveling
language: pt-BR
page_size: 5
api:
  endpoint: https://example.cdn.prismic.io/api/v2
  access_token: secret
revalidate:
  listing: 60
comments:
  repo: someone/blog-comments
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "Space Traveling");
        assert_eq!(config.language, "pt-BR");
        assert_eq!(config.page_size, 5);
        assert_eq!(config.api.endpoint, "https://example.cdn.prismic.io/api/v2");
        assert_eq!(config.api.access_token.as_deref(), Some("secret"));
        assert_eq!(config.api.document_type, "posts");
        assert_eq!(config.revalidate.listing, 60);
        assert_eq!(config.revalidate.post, 180);
        assert_eq!(config.comments.repo, "someone/blog-comments");
        assert_eq!(config.comments.theme, "dark-blue");
    }

    #[test]
    fn test_comments_need_a_repo() {
        let mut comments = CommentsConfig::default();
        assert!(!comments.is_active());
        assert!(comments.is_missing_repo());

        comments.repo = "someone/blog-comments".to_string();
        assert!(comments.is_active());
        assert!(!comments.is_missing_repo());

        comments.enable = false;
        assert!(!comments.is_active());
        assert!(!comments.is_missing_repo());
    }

    #[test]
    fn test_zero_page_size_is_clamped() {
        let config = SiteConfig {
            page_size: 0,
            ..SiteConfig::default()
        };
        assert_eq!(config.listing_page_size(), 1);
    }
}
