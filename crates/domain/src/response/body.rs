//! Body text extraction.
//!
//! Validators never inspect a response type directly. They ask for the
//! body through [`BodyText`], so any HTTP client's response (or a plain
//! string in tests) can be validated once it implements this trait.

use std::borrow::Cow;

/// Gives validators a textual view of a response body.
pub trait BodyText {
    /// Returns the body decoded as UTF-8, replacing invalid sequences.
    fn body_text(&self) -> Cow<'_, str>;
}

impl BodyText for str {
    fn body_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl BodyText for String {
    fn body_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

impl BodyText for [u8] {
    fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self)
    }
}

impl BodyText for Vec<u8> {
    fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self)
    }
}

impl<T: BodyText + ?Sized> BodyText for &T {
    fn body_text(&self) -> Cow<'_, str> {
        (**self).body_text()
    }
}
