//! Reading-time estimate for a post

use super::post::Section;
use super::richtext::as_text;

/// Assumed reading speed
pub const WORDS_PER_MINUTE: usize = 200;

/// Estimated minutes to read the given sections.
///
/// Each section is rounded up on its own, so many short sections add up to
/// more than the same text in one section: word counts `[199, 1]` give 2.
/// Words are counted by splitting the body text on single spaces; an empty
/// body still counts as one word.
pub fn reading_time(sections: &[Section]) -> u32 {
    sections.iter().map(section_minutes).sum()
}

fn section_minutes(section: &Section) -> u32 {
    let words = as_text(&section.body).split(' ').count();
    words.div_ceil(WORDS_PER_MINUTE) as u32
}
