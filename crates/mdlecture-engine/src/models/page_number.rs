use std::fmt;

use crate::roman;

/// Value of a page-number marker: a single page or a range like `100-103`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageValue {
    Single(u32),
    Range { start: u32, end: u32 },
}

impl PageValue {
    pub fn first(&self) -> u32 {
        match *self {
            PageValue::Single(n) => n,
            PageValue::Range { start, .. } => start,
        }
    }

    pub fn last(&self) -> u32 {
        match *self {
            PageValue::Single(n) => n,
            PageValue::Range { end, .. } => end,
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(self, PageValue::Range { .. })
    }

    /// A range whose end lies before its start.
    pub fn is_reversed(&self) -> bool {
        matches!(*self, PageValue::Range { start, end } if end < start)
    }
}

/// A `|| - Seite 12 -` marker found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageNumber {
    /// The word used in the marker, as written (`Seite`, `slide`, ...).
    pub identifier: String,
    pub value: PageValue,
    pub arabic: bool,
    /// 1-based line of the marker.
    pub line: usize,
}

impl PageNumber {
    pub fn new(identifier: impl Into<String>, value: PageValue, arabic: bool) -> Self {
        Self {
            identifier: identifier.into(),
            value,
            arabic,
            line: 0,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }

    /// Numeric part as it would be written in a document.
    pub fn format_value(&self) -> String {
        let render = |n: u32| {
            if self.arabic {
                n.to_string()
            } else {
                roman::to_roman(n).unwrap_or_else(|_| n.to_string())
            }
        };
        match self.value {
            PageValue::Single(n) => render(n),
            PageValue::Range { start, end } => format!("{}-{}", render(start), render(end)),
        }
    }
}

/// Renders the marker line, e.g. `|| - Seite XII -`.
impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "|| - {} {} -", self.identifier, self.format_value())
    }
}
