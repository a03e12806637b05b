//! Vocabulary entries laid out on the worksheet

/// One English phrase with its Pinyin syllables and Chinese characters.
///
/// Syllables and characters are meant to line up one-to-one, but the layout
/// engine tolerates a mismatch and fills the missing side with placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub english: String,
    pub pinyin: Vec<String>,
    pub chinese: Vec<String>,
}

impl Entry {
    pub fn new(english: &str, pinyin: &[&str], chinese: &[&str]) -> Self {
        Self {
            english: english.to_string(),
            pinyin: pinyin.iter().map(|s| s.to_string()).collect(),
            chinese: chinese.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Number of grid columns this entry needs before padding.
    pub fn cell_count(&self) -> usize {
        self.pinyin.len().max(self.chinese.len())
    }

    /// True when every syllable has a character and vice versa.
    pub fn is_aligned(&self) -> bool {
        self.pinyin.len() == self.chinese.len()
    }
}
