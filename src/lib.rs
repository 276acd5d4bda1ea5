//! headless-blog: a blog front-end over a headless CMS
//!
//! Posts live in a Prismic-style content API. This crate queries them,
//! renders the listing and post pages with built-in Tera templates, and
//! either writes them out as a static site or serves them on demand with a
//! render cache and preview mode.

pub mod cache;
pub mod cms;
pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod i18n;
pub mod pages;
pub mod preview;
pub mod server;
pub mod templates;

#[cfg(test)]
mod test_data;

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cms::{ApiClient, ContentSource, MemorySource};

/// The main blog application
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Where posts are read from
    pub source: Arc<dyn ContentSource>,
    /// Interface strings for the configured language
    pub i18n: i18n::I18n,
}

impl Blog {
    /// Create a blog from a directory holding `_config.yml`
    ///
    /// Posts come from the fixture file when `api.fixtures` is set,
    /// otherwise from the remote API at `api.endpoint`.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config = load_config(&base_dir)?;

        let source: Arc<dyn ContentSource> = if let Some(ref fixtures) = config.api.fixtures {
            let path = base_dir.join(fixtures);
            tracing::info!("Reading posts from fixtures {:?}", path);
            Arc::new(MemorySource::load(path)?)
        } else if !config.api.endpoint.is_empty() {
            tracing::info!("Reading posts from {}", config.api.endpoint);
            Arc::new(ApiClient::from_config(&config.api)?)
        } else {
            bail!("No content source configured: set api.endpoint or api.fixtures in _config.yml");
        };

        Self::with_source(base_dir, config, source)
    }

    /// Create a blog reading posts from the given source
    pub fn with_source<P: AsRef<Path>>(
        base_dir: P,
        config: config::SiteConfig,
        source: Arc<dyn ContentSource>,
    ) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);

        let mut i18n = i18n::I18n::new(&config.language);
        i18n.load_languages(base_dir.join(&config.i18n_dir))?;

        Ok(Self {
            config,
            base_dir,
            public_dir,
            source,
            i18n,
        })
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<()> {
        commands::generate::run(self).await
    }
}

/// Read `_config.yml` from `base_dir`, or the defaults when it is absent
pub fn load_config(base_dir: &Path) -> Result<config::SiteConfig> {
    let config_path = base_dir.join("_config.yml");
    if config_path.exists() {
        config::SiteConfig::load(&config_path)
    } else {
        Ok(config::SiteConfig::default())
    }
}
