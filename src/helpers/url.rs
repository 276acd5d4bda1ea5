//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::config::SiteConfig;

/// Characters escaped in a path segment: everything but unreserved ones
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/post/hello/") // -> "/blog/post/hello/"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let root = config.root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// URL of a post detail page, with the uid percent-encoded
pub fn post_url(config: &SiteConfig, uid: &str) -> String {
    url_for(
        config,
        &format!("post/{}/", utf8_percent_encode(uid, SEGMENT)),
    )
}

/// Whether `uid` can be used as a single directory name under `post/`
///
/// Rejects empty uids, path separators, control characters and names
/// starting with a dot (`.`, `..`, hidden files).
pub fn is_safe_uid(uid: &str) -> bool {
    !uid.is_empty()
        && !uid.starts_with('.')
        && !uid
            .chars()
            .any(|c| matches!(c, '/' | '\\' | ':') || c.is_control())
}

/// URL of the listing showing the first `pages` pages
pub fn listing_url(config: &SiteConfig, pages: usize) -> String {
    if pages <= 1 {
        url_for(config, "/")
    } else {
        url_for(config, &format!("page/{}/", pages))
    }
}
