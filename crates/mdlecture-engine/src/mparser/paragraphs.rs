use std::collections::BTreeMap;

/// Paragraphs of a document keyed by their 1-based start line.
///
/// Lines are stored with trailing whitespace removed. Blank lines between
/// paragraphs are not stored but are accounted for by the keys, so every
/// line keeps its position in the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraphs(BTreeMap<usize, Vec<String>>);

impl Paragraphs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split `text` on newlines into paragraphs.
    pub fn from_text(text: &str) -> Self {
        split_paragraphs(text.split('\n'), false)
    }

    /// Like [`Paragraphs::from_text`], but lines ending in a backslash are
    /// joined with their successor first.
    pub fn from_text_joined(text: &str) -> Self {
        split_paragraphs(text.split('\n'), true)
    }

    pub fn insert(&mut self, start_line: usize, lines: Vec<String>) {
        self.0.insert(start_line, lines);
    }

    pub fn get(&self, start_line: usize) -> Option<&[String]> {
        self.0.get(&start_line).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (usize, &[String])> {
        self.0.iter().map(|(start, lines)| (*start, lines.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Start line of the last paragraph.
    pub fn last_start(&self) -> Option<usize> {
        self.0.keys().next_back().copied()
    }

    /// Number of the last line covered by any paragraph.
    pub fn line_count(&self) -> usize {
        self.0
            .iter()
            .map(|(start, lines)| start + lines.len().saturating_sub(1))
            .max()
            .unwrap_or(0)
    }

    /// Reassemble the document, filling the gaps between paragraphs with
    /// blank lines.
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = vec![String::new(); self.line_count()];
        for (start, paragraph) in self.iter() {
            for (offset, line) in paragraph.iter().enumerate() {
                lines[start - 1 + offset] = line.clone();
            }
        }
        lines
    }

    pub fn into_inner(self) -> BTreeMap<usize, Vec<String>> {
        self.0
    }
}

impl FromIterator<(usize, Vec<String>)> for Paragraphs {
    fn from_iter<I: IntoIterator<Item = (usize, Vec<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Paragraphs {
    type Item = (&'a usize, &'a Vec<String>);
    type IntoIter = std::collections::btree_map::Iter<'a, usize, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Split lines into paragraphs separated by blank lines.
///
/// Runs of blank lines never produce empty paragraphs; the next paragraph
/// simply starts later.
pub fn split_paragraphs<I, S>(lines: I, join_lines: bool) -> Paragraphs
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let lines: Vec<String> = if join_lines {
        joined_lines(lines)
    } else {
        lines.into_iter().map(|l| l.as_ref().to_string()).collect()
    };

    let mut paragraphs = Paragraphs::new();
    let mut start = 1;
    let mut current = Vec::new();
    for (index, line) in lines.iter().enumerate() {
        let line = line.trim_end();
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.insert(start, std::mem::take(&mut current));
            }
            start = index + 2;
        } else {
            current.push(line.to_string());
        }
    }
    if !current.is_empty() {
        paragraphs.insert(start, current);
    }
    paragraphs
}

/// Join lines ending in `\` with the following line, replacing the backslash
/// by a space.
///
/// Every line swallowed by a join is paid back as a blank line once the
/// joined run reaches a blank separator, so lines after the separator keep
/// their original numbers. A join running into end of input just ends.
pub fn joined_lines<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut output = Vec::new();
    let mut owed_blanks = 0;
    let mut lines = lines.into_iter();

    while let Some(line) = lines.next() {
        let mut line = line.as_ref().trim_end().to_string();
        let mut hit_separator = false;

        while line.ends_with('\\') {
            line.pop();
            line.push(' ');
            match lines.next() {
                Some(next) if next.as_ref().trim().is_empty() => {
                    hit_separator = true;
                    break;
                }
                Some(next) => {
                    owed_blanks += 1;
                    line.push_str(next.as_ref().trim_end());
                }
                None => break,
            }
        }

        let is_blank = line.trim().is_empty();
        output.push(line.trim_end().to_string());
        if hit_separator {
            output.push(String::new());
        }
        if (is_blank || hit_separator) && owed_blanks > 0 {
            output.extend(std::iter::repeat_n(String::new(), owed_blanks));
            owed_blanks = 0;
        }
    }
    output
}
