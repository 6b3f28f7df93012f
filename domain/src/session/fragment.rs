//! Incremental text fragments and the per-generation accumulator.

/// One non-empty piece of incremental text decoded from a backend line.
///
/// Fragments are transient: they are written to the client, appended to a
/// [`Transcript`], and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment(String);

impl Fragment {
    /// Wrap a piece of text, returning `None` when it carries nothing to emit.
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.is_empty() { None } else { Some(Self(text)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for Fragment {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Ordered concatenation of every fragment delivered for one generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    text: String,
    fragments: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment in arrival order.
    pub fn push(&mut self, fragment: &Fragment) {
        self.text.push_str(fragment.as_str());
        self.fragments += 1;
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of fragments appended so far.
    pub fn fragment_count(&self) -> usize {
        self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_not_a_fragment() {
        assert!(Fragment::new("").is_none());
        assert!(Fragment::new(" ").is_some());
    }

    #[test]
    fn transcript_preserves_arrival_order() {
        let mut transcript = Transcript::new();
        for piece in ["Hi", " there", "!"] {
            transcript.push(&Fragment::new(piece).unwrap());
        }
        assert_eq!(transcript.as_str(), "Hi there!");
        assert_eq!(transcript.fragment_count(), 3);
    }

    #[test]
    fn new_transcript_is_empty() {
        let transcript = Transcript::new();
        assert!(transcript.is_empty());
        assert_eq!(transcript.into_text(), "");
    }
}
