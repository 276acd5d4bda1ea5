//! Generate static files

use anyhow::Result;

use crate::generator::Generator;
use crate::Blog;

/// Render every listing state and post into the public directory
pub async fn run(blog: &Blog) -> Result<()> {
    let start = std::time::Instant::now();

    let generator = Generator::new(&blog.config, &blog.i18n)?;
    generator
        .generate(blog.source.as_ref(), &blog.public_dir)
        .await?;

    let duration = start.elapsed();
    tracing::info!(
        "Generated {:?} in {:.2}s",
        blog.public_dir,
        duration.as_secs_f64()
    );

    Ok(())
}
