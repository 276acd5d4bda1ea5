//! List the posts of the site

use anyhow::Result;

use crate::helpers::format_date;
use crate::pages;
use crate::preview::PreviewSession;
use crate::Blog;

/// Walk every listing page and print its posts, newest first
pub async fn run(blog: &Blog) -> Result<()> {
    let source = blog.source.as_ref();
    let mut listing =
        pages::load_listing(source, &blog.config, &PreviewSession::published(), 1).await?;
    listing.load_pages(source, usize::MAX).await?;

    println!("Posts ({}):", listing.results().len());
    for post in listing.results() {
        let date = post
            .first_publication_date
            .map(|d| format_date(&d, "YYYY-MM-DD"))
            .unwrap_or_else(|| "unpublished".to_string());
        println!("  {} - {} [{}]", date, post.title, post.uid);
    }

    Ok(())
}
