use crate::error::FormattingError;
use crate::models::Heading;

/// What the enumerator needs to know about a heading.
pub trait Enumerable {
    fn level(&self) -> u8;
    fn chapter_number(&self) -> Option<u32>;
    fn text(&self) -> &str;
}

impl Enumerable for Heading {
    fn level(&self) -> u8 {
        Heading::level(self)
    }

    fn chapter_number(&self) -> Option<u32> {
        Heading::chapter_number(self)
    }

    fn text(&self) -> &str {
        Heading::text(self)
    }
}

/// Computes hierarchical heading numbers (`2`, `2.1`, `2.1.3`) from headings
/// registered in document order.
///
/// Each heading type needs its own enumerator.
#[derive(Debug, Clone, Default)]
pub struct ChapterNumberEnumerator {
    counters: [u32; Self::MAX_DEPTH],
    last_chapter: Option<u32>,
}

impl ChapterNumberEnumerator {
    pub const MAX_DEPTH: usize = 6;

    pub fn new() -> Self {
        Self::default()
    }

    /// Count `heading`. Fails if it does not know its chapter, leaving the
    /// enumerator unchanged.
    pub fn register(&mut self, heading: &impl Enumerable) -> Result<(), FormattingError> {
        let chapter = heading
            .chapter_number()
            .ok_or_else(|| FormattingError::new("heading has no chapter number", heading.text()))?;
        if self.last_chapter != Some(chapter) {
            self.counters = [0; Self::MAX_DEPTH];
            self.counters[0] = chapter;
            self.last_chapter = Some(chapter);
        }
        let level = usize::from(heading.level()).clamp(1, Self::MAX_DEPTH);
        if level > 1 {
            self.counters[level - 1] += 1;
            for counter in &mut self.counters[level..] {
                *counter = 0;
            }
        }
        Ok(())
    }

    /// Number of the last registered heading. Trailing zeros are dropped,
    /// the chapter number is always kept.
    pub fn enumeration(&self) -> Vec<u32> {
        let mut number = self.counters.to_vec();
        while number.len() > 1 && number.last() == Some(&0) {
            number.pop();
        }
        number
    }
}
