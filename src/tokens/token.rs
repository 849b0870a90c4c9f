//! Token type and tokenization of inserted text.
//!
//! A token is one word of previously inserted text together with the
//! whitespace that followed it, plus a normalized `phrase` used for phonetic
//! search.  `line_index` and `chars_from_line_end` are derived fields owned
//! by the buffer's reindexing pass — they are never authoritative on their
//! own.

use std::fmt;

// ---------------------------------------------------------------------------
// FormatTag
// ---------------------------------------------------------------------------

/// Casing/separator observations recorded at tokenization time.
///
/// This is a closed set dispatched through [`FORMAT_DETECTORS`] in a fixed
/// order; reformatting itself is a host-side concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatTag {
    /// Every alphabetic character is uppercase (at least two letters).
    AllCaps,
    /// First letter uppercase, the rest lowercase.
    Capitalized,
    /// Purely numeric content.
    Numeric,
    /// The visible text ends flush against the next token (no trailing
    /// whitespace).
    NoSpaceSuffix,
    /// The token terminates its line.
    LineEnd,
}

/// Fixed-order format detection: every matching tag is recorded, in this
/// order.
pub const FORMAT_DETECTORS: &[(FormatTag, fn(&str) -> bool)] = &[
    (FormatTag::AllCaps, is_all_caps),
    (FormatTag::Capitalized, is_capitalized),
    (FormatTag::Numeric, is_numeric),
    (FormatTag::NoSpaceSuffix, has_no_space_suffix),
    (FormatTag::LineEnd, ends_line),
];

fn is_all_caps(text: &str) -> bool {
    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase())
}

fn is_capitalized(text: &str) -> bool {
    let mut letters = text.chars().filter(|c| c.is_alphabetic());
    match letters.next() {
        Some(first) if first.is_uppercase() => letters.all(|c| c.is_lowercase()),
        _ => false,
    }
}

fn is_numeric(text: &str) -> bool {
    let visible: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    !visible.is_empty() && visible.iter().all(|c| c.is_ascii_digit())
}

fn has_no_space_suffix(text: &str) -> bool {
    text.chars().last().is_some_and(|c| !c.is_whitespace())
}

fn ends_line(text: &str) -> bool {
    text.ends_with('\n')
}

/// Run every detector in order and collect the matching tags.
pub fn detect_format(text: &str) -> Vec<FormatTag> {
    FORMAT_DETECTORS
        .iter()
        .filter(|(_, matches)| matches(text))
        .map(|(tag, _)| *tag)
        .collect()
}

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// One unit of previously inserted text.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Exact text, whitespace included.
    pub text: String,
    /// Lowercase alphanumeric normalization of `text`, used for matching.
    pub phrase: String,
    /// Casing/separator observations.
    pub format: Vec<FormatTag>,
    /// Derived: which line this token sits on.  Recomputed by reindexing.
    pub line_index: usize,
    /// Derived: characters between this token's visible end and the end of
    /// its line (line-trailing newline excluded).  Recomputed by reindexing.
    pub chars_from_line_end: usize,
}

impl Token {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            phrase: normalize_phrase(&text),
            format: detect_format(&text),
            line_index: 0,
            chars_from_line_end: 0,
            text,
        }
    }

    /// Number of chars in `text`.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Number of chars in `text` excluding a trailing newline.
    pub fn visible_len(&self) -> usize {
        let len = self.char_len();
        if self.is_line_end() {
            len - 1
        } else {
            len
        }
    }

    /// Whether this token terminates its line.
    pub fn is_line_end(&self) -> bool {
        self.text.ends_with('\n')
    }

    /// Whether the token carries no searchable content (pure whitespace or
    /// punctuation).
    pub fn is_blank(&self) -> bool {
        self.phrase.is_empty()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}:{}", self.text, self.line_index, self.chars_from_line_end)
    }
}

// ---------------------------------------------------------------------------
// Tokenization
// ---------------------------------------------------------------------------

/// Normalize text for phonetic search: lowercase, alphanumeric only.
pub fn normalize_phrase(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Split inserted text into tokens.
///
/// A token is a run of non-whitespace characters plus the whitespace that
/// follows it; a newline always terminates the token it ends so that line
/// counting stays a per-token property.  Leading whitespace at the start of
/// the input (or after a newline) begins the next token.
pub fn text_to_tokens(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_suffix = false;

    for c in text.chars() {
        if c == '\n' {
            current.push(c);
            tokens.push(Token::new(std::mem::take(&mut current)));
            in_suffix = false;
            continue;
        }
        if c.is_whitespace() {
            current.push(c);
            in_suffix = !current.chars().all(char::is_whitespace);
            continue;
        }
        // Word char: a fresh word after trailing whitespace starts a new
        // token.
        if in_suffix {
            tokens.push(Token::new(std::mem::take(&mut current)));
            in_suffix = false;
        }
        current.push(c);
    }
    if !current.is_empty() {
        tokens.push(Token::new(current));
    }
    tokens
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn splits_words_with_trailing_whitespace() {
        let tokens = text_to_tokens("Insert a new sentence.");
        assert_eq!(texts(&tokens), vec!["Insert ", "a ", "new ", "sentence."]);
    }

    #[test]
    fn newline_terminates_a_token() {
        let tokens = text_to_tokens("one two\nthree");
        assert_eq!(texts(&tokens), vec!["one ", "two\n", "three"]);
        assert!(tokens[1].is_line_end());
    }

    #[test]
    fn indentation_starts_the_next_token() {
        let tokens = text_to_tokens("foo\n  bar");
        assert_eq!(texts(&tokens), vec!["foo\n", "  bar"]);
        assert_eq!(tokens[1].phrase, "bar");
    }

    #[test]
    fn whitespace_only_input_is_one_blank_token() {
        let tokens = text_to_tokens("   ");
        assert_eq!(texts(&tokens), vec!["   "]);
        assert!(tokens[0].is_blank());
    }

    #[test]
    fn round_trip_concatenation() {
        let input = "Insert a new sentence. \nInsert a second sentence. \nend";
        let tokens = text_to_tokens(input);
        let rebuilt: String = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(rebuilt, input);
    }

    #[test]
    fn phrase_is_lowercase_alnum() {
        assert_eq!(normalize_phrase("Sentence. "), "sentence");
        assert_eq!(normalize_phrase("it's"), "its");
        assert_eq!(normalize_phrase("...  "), "");
    }

    #[test]
    fn format_tags_follow_fixed_order() {
        let token = Token::new("NASA\n");
        assert_eq!(token.format, vec![FormatTag::AllCaps, FormatTag::LineEnd]);

        let token = Token::new("Hello ");
        assert_eq!(token.format, vec![FormatTag::Capitalized]);

        let token = Token::new("42");
        assert_eq!(
            token.format,
            vec![FormatTag::Numeric, FormatTag::NoSpaceSuffix]
        );
    }

    #[test]
    fn visible_len_excludes_newline() {
        let token = Token::new("two\n");
        assert_eq!(token.char_len(), 4);
        assert_eq!(token.visible_len(), 3);
    }
}
