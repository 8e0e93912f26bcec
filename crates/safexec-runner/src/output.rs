use std::borrow::Cow;

/// Output captured from a successful run.
///
/// Text mode decodes the captured bytes as UTF-8 once the stream has closed,
/// so multi-byte characters split across read chunks survive intact. A
/// capture that is not valid UTF-8 becomes [`Output::Lossy`], which keeps the
/// exact bytes next to their lossy decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Text(String),
    Lossy { text: String, raw: Vec<u8> },
    Binary(Vec<u8>),
}

impl Output {
    #[must_use]
    pub fn from_captured(bytes: Vec<u8>, binary: bool) -> Self {
        if binary {
            return Self::Binary(bytes);
        }
        match String::from_utf8(bytes) {
            Ok(text) => Self::Text(text),
            Err(err) => {
                let raw = err.into_bytes();
                let text = String::from_utf8_lossy(&raw).into_owned();
                Self::Lossy { text, raw }
            }
        }
    }

    /// The captured bytes, exactly as the child wrote them.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Lossy { raw, .. } | Self::Binary(raw) => raw,
        }
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Text(text) => text.into_bytes(),
            Self::Lossy { raw, .. } | Self::Binary(raw) => raw,
        }
    }

    /// The text, if this output was captured in text mode.
    ///
    /// Invalid UTF-8 shows up here as U+FFFD; [`as_bytes`](Self::as_bytes)
    /// still has the original bytes.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) | Self::Lossy { text, .. } => Some(text),
            Self::Binary(_) => None,
        }
    }

    #[must_use]
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) | Self::Lossy { text, .. } => Cow::Borrowed(text),
            Self::Binary(bytes) => String::from_utf8_lossy(bytes),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}
