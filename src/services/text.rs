//! Text store: one shared document per room, last writer wins.
//!
//! The whole document is replaced on every edit. `version` counts accepted
//! writes; it is reported in logs and reserved for conflict detection.

#[derive(Debug, Clone, Default)]
pub struct TextStore {
    text: String,
    version: u64,
}

impl TextStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the document and return the stored text.
    pub fn set_full(&mut self, text: String) -> &str {
        self.text = text;
        self.version += 1;
        &self.text
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
#[path = "text_test.rs"]
mod tests;
