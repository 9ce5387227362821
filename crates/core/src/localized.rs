use serde::{Deserialize, Serialize};

/// Display text carried in both supported languages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedName {
    /// Arabic display text.
    pub arabic: String,
    /// English display text.
    pub english: String,
}

impl LocalizedName {
    /// Creates a localized name from both language values.
    #[must_use]
    pub fn new(arabic: impl Into<String>, english: impl Into<String>) -> Self {
        Self {
            arabic: arabic.into(),
            english: english.into(),
        }
    }

    /// Returns the English text, falling back to Arabic when English is blank.
    #[must_use]
    pub fn preferred(&self) -> &str {
        if self.english.trim().is_empty() {
            self.arabic.as_str()
        } else {
            self.english.as_str()
        }
    }
}
