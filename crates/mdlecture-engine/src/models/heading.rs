/// Which numbering stream a heading belongs to. Decided by the directory the
/// file lives in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HeadingType {
    #[default]
    Normal,
    Preface,
    Appendix,
}

/// One heading occurrence within a chapter file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    text: String,
    level: u8,
    line: usize,
    id: String,
    chapter_number: Option<u32>,
    heading_type: HeadingType,
    number: Option<Vec<u32>>,
    unedited: bool,
}

impl Heading {
    /// Create a heading; `level` is clamped to 1..=6.
    pub fn new(text: impl Into<String>, level: u8) -> Self {
        let text = text.into();
        let id = gen_id(&text);
        Self {
            text,
            level: level.clamp(1, 6),
            line: 0,
            id,
            chapter_number: None,
            heading_type: HeadingType::Normal,
            number: None,
            unedited: false,
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }

    pub fn with_chapter_number(mut self, chapter_number: u32) -> Self {
        self.chapter_number = Some(chapter_number);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// 1-based line the heading starts on.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Anchor the rendered HTML is expected to carry for this heading.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn chapter_number(&self) -> Option<u32> {
        self.chapter_number
    }

    pub fn set_chapter_number(&mut self, chapter_number: u32) {
        self.chapter_number = Some(chapter_number);
    }

    pub fn heading_type(&self) -> HeadingType {
        self.heading_type
    }

    pub fn set_heading_type(&mut self, heading_type: HeadingType) {
        self.heading_type = heading_type;
    }

    /// Hierarchical number assigned by the chapter enumerator.
    pub fn number(&self) -> Option<&[u32]> {
        self.number.as_deref()
    }

    pub fn set_number(&mut self, number: Vec<u32>) {
        self.number = Some(number);
    }

    /// Set for headings of a file that still consists of the generated
    /// skeleton only.
    pub fn is_unedited(&self) -> bool {
        self.unedited
    }

    pub fn set_unedited(&mut self, unedited: bool) {
        self.unedited = unedited;
    }
}

/// Derive an anchor id from heading text: lower-cased, whitespace turned into
/// hyphens, everything outside `[a-z0-9._-]` and German umlauts dropped,
/// leading hyphens stripped.
pub fn gen_id(text: &str) -> String {
    let id: String = text
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            c if c.is_whitespace() => Some('-'),
            'a'..='z' | '0'..='9' | '.' | '_' | '-' | 'ä' | 'ö' | 'ü' | 'ß' => Some(c),
            _ => None,
        })
        .collect();
    id.trim_start_matches('-').to_string()
}
