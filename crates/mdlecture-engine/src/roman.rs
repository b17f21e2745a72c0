//! Roman numerals as used for front-matter page numbers.

use std::sync::OnceLock;

use regex::Regex;

pub const MAX_ROMAN: u32 = 4999;

const NUMERALS: [(&str, u32); 13] = [
    ("M", 1000),
    ("CM", 900),
    ("D", 500),
    ("CD", 400),
    ("C", 100),
    ("XC", 90),
    ("L", 50),
    ("XL", 40),
    ("X", 10),
    ("IX", 9),
    ("V", 5),
    ("IV", 4),
    ("I", 1),
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RomanError {
    #[error("roman numeral must not be empty")]
    Empty,
    #[error("invalid roman numeral: {0}")]
    Invalid(String),
    #[error("{0} cannot be written as a roman numeral (must be 1..={MAX_ROMAN})")]
    OutOfRange(u32),
}

fn canonical_form() -> &'static Regex {
    static CANONICAL: OnceLock<Regex> = OnceLock::new();
    CANONICAL.get_or_init(|| {
        Regex::new(r"^M{0,4}(?:CM|CD|D?C{0,3})(?:XC|XL|L?X{0,3})(?:IX|IV|V?I{0,3})$")
            .expect("Invalid roman numeral regex")
    })
}

/// Render `n` as an upper-case roman numeral.
pub fn to_roman(mut n: u32) -> Result<String, RomanError> {
    if n == 0 || n > MAX_ROMAN {
        return Err(RomanError::OutOfRange(n));
    }
    let mut result = String::new();
    for (numeral, value) in NUMERALS {
        while n >= value {
            result.push_str(numeral);
            n -= value;
        }
    }
    Ok(result)
}

/// Decode a roman numeral. Lower-case input is accepted; anything not in
/// canonical form (e.g. `IIII`, `VX`) is rejected.
pub fn from_roman(letters: &str) -> Result<u32, RomanError> {
    if letters.is_empty() {
        return Err(RomanError::Empty);
    }
    let upper = letters.to_ascii_uppercase();
    if !canonical_form().is_match(&upper) {
        return Err(RomanError::Invalid(letters.to_string()));
    }

    let mut rest = upper.as_str();
    let mut result = 0;
    for (numeral, value) in NUMERALS {
        while let Some(tail) = rest.strip_prefix(numeral) {
            result += value;
            rest = tail;
        }
    }
    Ok(result)
}
