//! The `Text` field value: a sequence of `(charset, text)` words whose
//! concatenation yields the logical string. Most header kinds only ever
//! want the flattened `String` (`Header::as_unstructured`), but the RFC
//! 2047-bearing `Subject`/`Comments` kind needs per-word charset
//! provenance preserved for callers that care which run of the text
//! came from which encoded word.

use crate::headermap::EncodeHeaderValue;
use crate::SharedString;

/// One word of a `Text` field value: the charset it was declared or
/// assumed to be in, and its decoded text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextWord {
    pub charset: String,
    pub text: String,
}

/// A field value made up of an ordered sequence of `TextWord`s. This is
/// the `Text` variant from the field registry (spec'd as "a sequence of
/// words, each a (charset, bytes) pair").
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Text(pub Vec<TextWord>);

impl Text {
    pub fn new(words: Vec<TextWord>) -> Self {
        Self(words)
    }

    /// A single-word `Text` consisting of plain ASCII/us-ascii content.
    pub fn plain(s: impl Into<String>) -> Self {
        Self(vec![TextWord {
            charset: "us-ascii".to_string(),
            text: s.into(),
        }])
    }

    pub fn words(&self) -> &[TextWord] {
        &self.0
    }

    /// Concatenates the words into the logical string value.
    pub fn to_plain_string(&self) -> String {
        let mut result = String::new();
        for word in &self.0 {
            result.push_str(&word.text);
        }
        result
    }
}

impl std::fmt::Display for Text {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        fmt.write_str(&self.to_plain_string())
    }
}

impl From<&str> for Text {
    fn from(s: &str) -> Self {
        Self::plain(s)
    }
}

impl From<String> for Text {
    fn from(s: String) -> Self {
        Self::plain(s)
    }
}

impl EncodeHeaderValue for Text {
    fn encode_value(&self) -> SharedString<'static> {
        let s = self.to_plain_string();
        if s.is_ascii() {
            crate::textwrap::wrap(&s).into()
        } else {
            crate::encoded_word::encode_word(&s).into()
        }
    }
}
