#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composer {
    text: String,
}

impl Composer {
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// True iff the trimmed text is non-empty.
    pub fn is_valid(&self) -> bool {
        !self.text.trim().is_empty()
    }
}
