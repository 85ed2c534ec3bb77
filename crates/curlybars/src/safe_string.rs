//! Escaping-consistent output strings.
//!
//! Template text is trusted and goes into the output as-is; every other
//! value is HTML-escaped on the way in unless it already is a [`SafeString`].

use std::fmt;

use crate::value::Value;

/// Escape HTML special characters: & < > " '
pub fn escape(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#39;"),
            _ => output.push(c),
        }
    }
    output
}

/// A string that is safe to embed in the rendered document as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SafeString(String);

impl SafeString {
    /// Wrap markup the caller vouches for.
    pub fn trusted(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    /// Escape arbitrary text.
    pub fn escape(text: &str) -> Self {
        Self(escape(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for SafeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SafeString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<SafeString> for String {
    fn from(value: SafeString) -> Self {
        value.0
    }
}

impl PartialEq<str> for SafeString {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for SafeString {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Output buffer for a render.
#[derive(Debug, Default)]
pub struct SafeBuffer {
    buf: String,
}

impl SafeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append trusted markup without escaping.
    pub fn safe_concat(&mut self, markup: &str) {
        self.buf.push_str(markup);
    }

    /// Append a value, escaping it unless it is already safe.
    pub fn concat(&mut self, value: &Value) {
        match value {
            Value::SafeString(safe) => self.buf.push_str(safe.as_str()),
            other => self.buf.push_str(&escape(&other.to_string())),
        }
    }

    pub fn into_safe_string(self) -> SafeString {
        SafeString(self.buf)
    }
}
