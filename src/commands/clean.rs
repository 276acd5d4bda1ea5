//! Clean the public directory

use anyhow::Result;
use std::fs;
use std::path::Path;

/// Remove the generated site of the blog in `base_dir`, without needing a
/// reachable content source
pub fn clean_site(base_dir: &Path) -> Result<()> {
    let config = crate::load_config(base_dir)?;
    let public_dir = base_dir.join(&config.public_dir);

    if public_dir.exists() {
        fs::remove_dir_all(&public_dir)?;
        tracing::info!("Deleted: {:?}", public_dir);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clean_removes_public_dir() {
        let tmp = TempDir::new().unwrap();
        let public_dir = tmp.path().join("public");
        fs::create_dir_all(public_dir.join("post/a")).unwrap();
        fs::write(public_dir.join("index.html"), "<html></html>").unwrap();

        clean_site(tmp.path()).unwrap();
        assert!(!public_dir.exists());

        // Cleaning twice is fine
        clean_site(tmp.path()).unwrap();
    }

    #[test]
    fn test_clean_site_reads_public_dir_from_config() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("_config.yml"), "public_dir: dist\n").unwrap();
        fs::create_dir_all(tmp.path().join("dist")).unwrap();
        fs::create_dir_all(tmp.path().join("public")).unwrap();

        clean_site(tmp.path()).unwrap();
        assert!(!tmp.path().join("dist").exists());
        assert!(tmp.path().join("public").exists());
    }
}
