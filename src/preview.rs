//! Preview mode
//!
//! A preview session carries the draft reference chosen by an editor. It is
//! read from a cookie on every request and handed explicitly to the page
//! loaders; nothing about preview state is global.

use axum::http::{header, HeaderMap};
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};

/// Cookie holding the preview reference
pub const PREVIEW_COOKIE: &str = "headless_blog.preview";

/// Content reference selected for one visitor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewSession {
    reference: Option<String>,
}

impl PreviewSession {
    /// Session reading published content
    pub fn published() -> Self {
        Self::default()
    }

    /// Session reading the drafts of `reference`
    pub fn with_reference(reference: impl Into<String>) -> Self {
        let reference = reference.into();
        Self {
            reference: (!reference.is_empty()).then_some(reference),
        }
    }

    pub fn is_active(&self) -> bool {
        self.reference.is_some()
    }

    /// Reference to query with; `None` selects published content
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    /// Read the session from the request's `Cookie` headers
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(Self::from_cookie_header)
            .find(Self::is_active)
            .unwrap_or_default()
    }

    /// Parse a `Cookie` header value such as `a=1; headless_blog.preview=...`
    pub fn from_cookie_header(value: &str) -> Self {
        value
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == PREVIEW_COOKIE)
            .map(|(_, raw)| {
                let decoded = percent_decode_str(raw.trim_matches('"')).decode_utf8_lossy();
                Self::with_reference(decoded.into_owned())
            })
            .unwrap_or_default()
    }
}

/// `Set-Cookie` value entering preview mode
pub fn set_cookie(reference: &str) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        PREVIEW_COOKIE,
        utf8_percent_encode(reference, NON_ALPHANUMERIC)
    )
}

/// `Set-Cookie` value leaving preview mode
pub fn clear_cookie() -> String {
    format!(
        "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax",
        PREVIEW_COOKIE
    )
}
