use include_dir::{include_dir, Dir};
use itertools::Itertools;
use rand::Rng;
use serde::Deserialize;

use crate::session::SessionError;

static WORDS_DIR: Dir = include_dir!("src/words");

/// Fixed vocabulary the generator draws from, embedded at compile time.
#[derive(Deserialize, Clone, Debug)]
pub struct Vocabulary {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

impl Vocabulary {
    pub fn load(file_name: &str) -> Self {
        let file = WORDS_DIR
            .get_file(file_name)
            .expect("Word list file not found");

        let contents = file
            .contents_utf8()
            .expect("Unable to interpret word list as a string");

        serde_json::from_str(contents).expect("Unable to deserialize word list json")
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::load("english.json")
    }
}

/// Immutable practice text for one session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PracticeText {
    raw: String,
    chars: Vec<char>,
}

impl PracticeText {
    pub fn new(raw: String) -> Self {
        let chars = raw.chars().collect();
        Self { raw, chars }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn char_at(&self, idx: usize) -> Option<char> {
        self.chars.get(idx).copied()
    }
}

/// Produces practice text by sampling the vocabulary with replacement.
#[derive(Clone, Debug)]
pub struct TextGenerator {
    vocabulary: Vocabulary,
}

impl TextGenerator {
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Generate `word_count` uniformly random words joined by single spaces.
    pub fn generate(&self, word_count: usize) -> Result<PracticeText, SessionError> {
        if word_count == 0 {
            return Err(SessionError::InvalidWordCount(word_count));
        }

        let mut rng = rand::thread_rng();
        let text = (0..word_count)
            .map(|_| {
                let idx = rng.gen_range(0..self.vocabulary.words.len());
                self.vocabulary.words[idx].as_str()
            })
            .join(" ");

        Ok(PracticeText::new(text))
    }
}

impl Default for TextGenerator {
    fn default() -> Self {
        Self::new(Vocabulary::default())
    }
}
