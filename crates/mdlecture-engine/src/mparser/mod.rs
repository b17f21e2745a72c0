//! Line-accurate extraction of headings, page numbers, formulas and links
//! from lecture markdown.
//!
//! Every extractor works on [`Paragraphs`], so line numbers always refer to
//! the original file. Run [`remove_codeblocks`] first when code must not be
//! mistaken for content.

pub mod codeblocks;
pub mod formulas;
pub mod headings;
pub mod links;
pub mod pagenumbers;
pub mod paragraphs;

pub use codeblocks::remove_codeblocks;
pub use formulas::{Formulas, parse_formulas, unterminated_inline_formulas};
pub use headings::{chapter_number_from_path, extract_headings, extract_headings_from_file};
pub use links::{extract_references, html_ids};
pub use pagenumbers::{
    PAGE_NUMBERING_TOKENS, extract_page_numbers, page_number_pattern, scan_page_numbers, try_extract_page_numbers,
};
pub use paragraphs::{Paragraphs, joined_lines, split_paragraphs};
