use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::models::{Reference, ReferenceKind};

struct LinkPatterns {
    inline: Regex,
    implicit: Regex,
    explicit: Regex,
    brackets: Regex,
    angle_brackets: Regex,
    html_ids: Regex,
}

fn patterns() -> &'static LinkPatterns {
    static PATTERNS: OnceLock<LinkPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| LinkPatterns {
        // [text](target "title")
        inline: Regex::new(r"(!?)\[([^\]]+)\]\(([^)\s]+)[^)]*\)").expect("Invalid inline link regex"),
        // [text][id]
        implicit: Regex::new(r"(!?)\[([^\]]+)\]\[([^\]]+)\]").expect("Invalid implicit link regex"),
        // [id]: target
        explicit: Regex::new(r"(?m)^[ \t]{0,3}(!?)\[([^\]]+)\]:[ \t]*<?([^>\s]+)>?")
            .expect("Invalid explicit link regex"),
        brackets: Regex::new(r"(!?)\[([^\]\[]+)\]").expect("Invalid bracket regex"),
        // <target>, no whitespace inside
        angle_brackets: Regex::new(r"<([^\s<>]+)>").expect("Invalid angle bracket regex"),
        html_ids: Regex::new(r#"<(?:div|span)[^>]*?id=["'](\S+?)["']"#).expect("Invalid html id regex"),
    })
}

fn line_of(text: &str, offset: usize) -> usize {
    1 + text[..offset].matches('\n').count()
}

fn reference(text: &str, kind: ReferenceKind, captures: &Captures<'_>, id_group: usize) -> Reference {
    let start = captures.get(0).map_or(0, |m| m.start());
    let is_image = captures.get(1).is_some_and(|m| !m.as_str().is_empty());
    Reference::new(kind, &captures[id_group], line_of(text, start)).image(is_image)
}

/// Every link, image and footnote reference of `text`, ordered by line.
pub fn extract_references(text: &str) -> Vec<Reference> {
    let patterns = patterns();
    let mut references = Vec::new();

    for captures in patterns.inline.captures_iter(text) {
        references.push(reference(text, ReferenceKind::Inline, &captures, 2).with_link(&captures[3]));
    }
    for captures in patterns.implicit.captures_iter(text) {
        references.push(reference(text, ReferenceKind::Implicit, &captures, 3));
    }
    for captures in patterns.explicit.captures_iter(text) {
        references.push(reference(text, ReferenceKind::Explicit, &captures, 2).with_link(&captures[3]));
    }
    references.extend(standalone_references(text));
    references.extend(auto_links(text));

    references.sort_by_key(|r| r.line);
    references
}

/// `[id]` and `[id][]`: brackets not belonging to any other link syntax.
fn standalone_references(text: &str) -> Vec<Reference> {
    let mut references = Vec::new();
    for captures in patterns().brackets.captures_iter(text) {
        let Some(whole) = captures.get(0) else { continue };
        let before = text[..whole.start()].chars().next_back();
        let mut rest = &text[whole.end()..];
        if let Some(collapsed) = rest.strip_prefix("[]") {
            rest = collapsed;
        } else if matches!(rest.chars().next(), Some('[' | '(' | ':')) {
            continue;
        }
        if before == Some(']') {
            continue;
        }
        references.push(reference(text, ReferenceKind::Standalone, &captures, 2));
    }
    references
}

/// `<k02/k02.html>` or `<https://example.org>`. Html tags, `<div>` and
/// `<span>` in particular, and the target of `[id]: <target>` are skipped.
fn auto_links(text: &str) -> Vec<Reference> {
    let mut references = Vec::new();
    for captures in patterns().angle_brackets.captures_iter(text) {
        let Some(whole) = captures.get(0) else { continue };
        let target = &captures[1];
        let lowercase = target.to_lowercase();
        let is_tag = lowercase.starts_with("div")
            || lowercase.starts_with("span")
            || target.starts_with(['!', '/'])
            || target.ends_with('/')
            || !target.contains(['.', ':']);
        let is_definition = text[..whole.start()].trim_end_matches([' ', '\t']).ends_with("]:");
        if is_tag || is_definition {
            continue;
        }
        let line = line_of(text, whole.start());
        references.push(Reference::new(ReferenceKind::AutoLink, target, line).with_link(target));
    }
    references
}

/// Ids of `<div>` and `<span>` elements, possible link anchors besides
/// headings.
pub fn html_ids(text: &str) -> BTreeSet<String> {
    patterns()
        .html_ids
        .captures_iter(text)
        .map(|captures| captures[1].to_string())
        .collect()
}
