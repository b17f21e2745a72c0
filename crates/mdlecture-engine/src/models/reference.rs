/// Which link syntax a [`Reference`] was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// `[text](target)`
    Inline,
    /// `[text][id]`, resolved by a matching [`ReferenceKind::Explicit`]
    Implicit,
    /// `[id]: target`
    Explicit,
    /// `[id]` or `[id][]`
    Standalone,
    /// `<target>`
    AutoLink,
}

/// A link, image or footnote occurrence in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub kind: ReferenceKind,
    pub is_image: bool,
    pub is_footnote: bool,
    /// Link text, or the identifier for implicit, explicit and standalone references.
    pub id: String,
    /// Target; `None` for references that only name an identifier.
    pub link: Option<String>,
    pub line: usize,
}

impl Reference {
    pub fn new(kind: ReferenceKind, id: impl Into<String>, line: usize) -> Self {
        let id = id.into();
        Self {
            kind,
            is_image: false,
            is_footnote: id.starts_with('^'),
            id,
            link: None,
            line,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn image(mut self, is_image: bool) -> Self {
        self.is_image = is_image;
        self
    }

    /// Identifier used to pair implicit and explicit references.
    pub fn pairing_key(&self) -> String {
        self.id.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footnote_detected_from_caret() {
        let footnote = Reference::new(ReferenceKind::Explicit, "^1", 3).with_link("Some note");
        let link = Reference::new(ReferenceKind::Implicit, "Docs", 1);
        assert!(footnote.is_footnote);
        assert!(!link.is_footnote);
        assert_eq!(link.pairing_key(), "docs");
    }
}
