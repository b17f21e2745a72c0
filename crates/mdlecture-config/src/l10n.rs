//! Translations of the few phrases mdlecture writes into generated documents.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    De,
    En,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::De => "de",
            Language::En => "en",
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "de" => Ok(Language::De),
            "en" => Ok(Language::En),
            other => Err(format!("unsupported language \"{other}\", expected de or en")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phrase {
    TableOfContents,
    Preface,
    Chapters,
    Appendix,
    TitlePage,
    Glossary,
    Index,
    ListOfAbbreviations,
    ListOfTactileGraphics,
    CopyrightNotice,
    AccessibilityRemarks,
    NotEdited,
    Page,
    Pages,
    Previous,
    Next,
    Chapter,
    Paper,
    Images,
    ImageDescriptions,
}

/// Looks up phrases for one language. Phrases are lower case; callers apply
/// [`title_case`] or [`capitalize`] where the output needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translator {
    language: Language,
}

impl Translator {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn get(&self, phrase: Phrase) -> &'static str {
        match self.language {
            Language::En => english(phrase),
            Language::De => german(phrase),
        }
    }
}

fn english(phrase: Phrase) -> &'static str {
    match phrase {
        Phrase::TableOfContents => "table of contents",
        Phrase::Preface => "preface",
        Phrase::Chapters => "chapters",
        Phrase::Appendix => "appendix",
        Phrase::TitlePage => "title page",
        Phrase::Glossary => "glossary",
        Phrase::Index => "index",
        Phrase::ListOfAbbreviations => "list of abbreviations",
        Phrase::ListOfTactileGraphics => "list of tactile graphics",
        Phrase::CopyrightNotice => "copyright notice",
        Phrase::AccessibilityRemarks => "remarks about the accessible version",
        Phrase::NotEdited => "not edited",
        Phrase::Page => "page",
        Phrase::Pages => "pages",
        Phrase::Previous => "previous",
        Phrase::Next => "next",
        Phrase::Chapter => "chapter",
        Phrase::Paper => "paper",
        Phrase::Images => "images",
        Phrase::ImageDescriptions => "image descriptions",
    }
}

fn german(phrase: Phrase) -> &'static str {
    match phrase {
        Phrase::TableOfContents => "inhaltsverzeichnis",
        Phrase::Preface => "vorwort",
        Phrase::Chapters => "kapitel",
        Phrase::Appendix => "anhang",
        Phrase::TitlePage => "titelblatt",
        Phrase::Glossary => "glossar",
        Phrase::Index => "stichwortverzeichnis",
        Phrase::ListOfAbbreviations => "abkürzungsverzeichnis",
        Phrase::ListOfTactileGraphics => "verzeichnis der taktilen grafiken",
        Phrase::CopyrightNotice => "urheberrechtshinweis",
        Phrase::AccessibilityRemarks => "hinweise zur barrierefreien version",
        Phrase::NotEdited => "nicht bearbeitet",
        Phrase::Page => "seite",
        Phrase::Pages => "seiten",
        Phrase::Previous => "vorheriges",
        Phrase::Next => "nächstes",
        Phrase::Chapter => "kapitel",
        Phrase::Paper => "blatt",
        Phrase::Images => "bilder",
        Phrase::ImageDescriptions => "bildbeschreibungen",
    }
}

/// Upper-case the first letter of every word.
pub fn title_case(text: &str) -> String {
    text.split(' ').map(capitalize).collect::<Vec<_>>().join(" ")
}

/// Upper-case the first letter of `text`.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_translations_differ_per_language() {
        let de = Translator::new(Language::De);
        let en = Translator::new(Language::En);
        assert_eq!(de.get(Phrase::NotEdited), "nicht bearbeitet");
        assert_eq!(en.get(Phrase::NotEdited), "not edited");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("table of contents"), "Table Of Contents");
        assert_eq!(title_case("inhaltsverzeichnis"), "Inhaltsverzeichnis");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_capitalize_non_ascii() {
        assert_eq!(capitalize("übersicht"), "Übersicht");
    }

    #[test]
    fn test_language_from_str() {
        assert_eq!("EN".parse::<Language>().unwrap(), Language::En);
        assert!("fr".parse::<Language>().is_err());
    }
}
