//! Helper functions shared by page rendering

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;
