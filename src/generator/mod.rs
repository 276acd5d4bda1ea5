//! Generator module - renders pages with the built-in Tera templates and
//! writes the static site

use anyhow::{Context as _, Result};
use std::fs;
use std::path::Path;

use tera::Context;

use crate::cms::ContentSource;
use crate::config::SiteConfig;
use crate::content::{as_html, Listing, NeighborRef, PostSummary};
use crate::helpers::{
    date_xml, escape_html, format_date, format_date_localized, is_safe_uid, listing_url, post_url,
    url_for,
};
use crate::i18n::I18n;
use crate::pages::{self, PostPage};
use crate::preview::PreviewSession;
use crate::templates::{
    CommentsData, NavPost, PostItem, PostView, SectionView, SiteData, TemplateRenderer,
};

/// Page renderer and static site writer
pub struct Generator {
    config: SiteConfig,
    i18n: I18n,
    renderer: TemplateRenderer,
}

impl Generator {
    /// Create a new generator
    pub fn new(config: &SiteConfig, i18n: &I18n) -> Result<Self> {
        if config.comments.is_missing_repo() {
            tracing::warn!(
                "Comments are enabled but comments.repo is empty; posts will have no comments"
            );
        }

        Ok(Self {
            config: config.clone(),
            i18n: i18n.clone(),
            renderer: TemplateRenderer::new()?,
        })
    }

    /// Generate the entire site into `public_dir`
    ///
    /// Every cumulative listing state gets its own page, and every listed
    /// post gets a detail page.
    pub async fn generate(&self, source: &dyn ContentSource, public_dir: &Path) -> Result<()> {
        fs::create_dir_all(public_dir)?;
        let session = PreviewSession::published();

        let mut listing = pages::load_listing(source, &self.config, &session, 1).await?;
        loop {
            let html = self.render_listing(&listing, &session)?;
            write_page(public_dir, &listing_path(listing.pages_loaded()), &html)?;

            if !listing.load_more(source).await? {
                break;
            }
        }
        tracing::info!(
            "Generated {} listing pages",
            listing.pages_loaded()
        );

        let mut count = 0;
        for summary in listing.results() {
            if !is_safe_uid(&summary.uid) {
                tracing::warn!("Skipping post with unsafe uid {:?}", summary.uid);
                continue;
            }
            let Some(page) = pages::load_post(source, &self.config, &session, &summary.uid).await?
            else {
                tracing::warn!("Listed post {} could not be loaded", summary.uid);
                continue;
            };

            let html = self.render_post(&page, &session)?;
            write_page(public_dir, &format!("post/{}/index.html", summary.uid), &html)?;
            count += 1;
        }
        tracing::info!("Generated {} posts", count);

        let html = self.render_not_found(&session)?;
        write_page(public_dir, "404.html", &html)?;

        Ok(())
    }

    /// Create a base context with common variables
    fn create_base_context(&self, session: &PreviewSession) -> Context {
        let site = SiteData {
            title: escape_html(&self.config.title),
            language: escape_html(&self.config.language),
            logo: escape_html(&url_for(&self.config, &self.config.logo)),
            home: escape_html(&url_for(&self.config, "/")),
        };

        let mut context = Context::new();
        context.insert("site", &site);
        context.insert("t", &self.i18n.get_all_translations());
        context.insert("preview", &session.is_active());
        context.insert(
            "exit_preview_url",
            &escape_html(&url_for(&self.config, "api/exit-preview")),
        );
        context
    }

    /// Render the listing with every post loaded so far
    pub fn render_listing(&self, listing: &Listing, session: &PreviewSession) -> Result<String> {
        let posts: Vec<PostItem> = listing
            .results()
            .iter()
            .map(|p| self.post_item(p))
            .collect();

        // Each listing page shows the cumulative results of its first n pages
        let load_more_url = listing
            .can_load_more()
            .then(|| escape_html(&listing_url(&self.config, listing.pages_loaded() + 1)));

        let mut context = self.create_base_context(session);
        context.insert("posts", &posts);
        context.insert("load_more_url", &load_more_url);

        self.renderer.render("index.html", &context)
    }

    /// Render a post detail page
    pub fn render_post(&self, page: &PostPage, session: &PreviewSession) -> Result<String> {
        let post = &page.post;

        let (date, datetime) = match post.first_publication_date {
            Some(ref first) => (
                format_date_localized(first, &self.config.date_format, &self.i18n),
                date_xml(first),
            ),
            None => (String::new(), String::new()),
        };

        let edited = post
            .last_publication_date
            .filter(|_| post.was_edited())
            .map(|last| {
                format!(
                    "{} {}, {} {}",
                    self.i18n.get("edited_on"),
                    format_date_localized(&last, &self.config.date_format, &self.i18n),
                    self.i18n.get("at"),
                    format_date(&last, &self.config.time_format)
                )
            });

        let view = PostView {
            title: escape_html(&post.title),
            banner_url: post.banner_url.as_deref().map(escape_html),
            author: escape_html(&post.author),
            date,
            datetime,
            edited: edited.as_deref().map(escape_html),
            reading_time: page.reading_time,
            sections: post
                .content
                .iter()
                .map(|s| SectionView {
                    heading: escape_html(&s.heading),
                    html: as_html(&s.body),
                })
                .collect(),
        };

        let mut context = self.create_base_context(session);
        context.insert("post", &view);
        context.insert("previous", &page.neighbors.previous.as_ref().map(|n| self.nav_post(n)));
        context.insert("next", &page.neighbors.next.as_ref().map(|n| self.nav_post(n)));
        context.insert("comments", &self.comments());

        self.renderer.render("post.html", &context)
    }

    /// Render the page shown when no post matches the requested slug
    pub fn render_not_found(&self, session: &PreviewSession) -> Result<String> {
        let context = self.create_base_context(session);
        self.renderer.render("not_found.html", &context)
    }

    fn post_item(&self, post: &PostSummary) -> PostItem {
        let (date, datetime) = match post.first_publication_date {
            Some(ref first) => (
                format_date_localized(first, &self.config.date_format, &self.i18n),
                date_xml(first),
            ),
            None => (String::new(), String::new()),
        };

        PostItem {
            url: escape_html(&post_url(&self.config, &post.uid)),
            title: escape_html(&post.title),
            subtitle: escape_html(&post.subtitle),
            author: escape_html(&post.author),
            date,
            datetime,
        }
    }

    fn nav_post(&self, neighbor: &NeighborRef) -> NavPost {
        NavPost {
            title: escape_html(&neighbor.title),
            url: escape_html(&post_url(&self.config, &neighbor.uid)),
        }
    }

    fn comments(&self) -> Option<CommentsData> {
        let comments = &self.config.comments;
        if !comments.is_active() {
            return None;
        }

        Some(CommentsData {
            src: escape_html(&comments.src),
            repo: escape_html(&comments.repo),
            issue_term: escape_html(&comments.issue_term),
            theme: escape_html(&comments.theme),
        })
    }
}

/// Output path of the listing showing the first `pages` pages
fn listing_path(pages: usize) -> String {
    if pages <= 1 {
        "index.html".to_string()
    } else {
        format!("page/{}/index.html", pages)
    }
}

fn write_page(public_dir: &Path, relative: &str, html: &str) -> Result<()> {
    let output_path = public_dir.join(relative);
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create dir {:?}", parent))?;
    }
    fs::write(&output_path, html).with_context(|| format!("Failed to write {:?}", output_path))?;
    tracing::debug!("Generated: {:?}", output_path);
    Ok(())
}
