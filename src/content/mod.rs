//! Content module - post models, rich text and the listing/navigation logic

mod listing;
mod neighbors;
mod post;
mod reading_time;
mod richtext;

pub use listing::{Cursor, Listing};
pub use neighbors::{resolve_neighbors, Neighbors};
pub use post::{NeighborRef, PostDetail, PostSummary, Section};
pub use reading_time::{reading_time, WORDS_PER_MINUTE};
pub use richtext::{as_html, as_text, RichTextBlock, Span};
