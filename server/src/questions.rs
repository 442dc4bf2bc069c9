//! Question set loading and rotation
//!
//! Questions are loaded once at startup from a JSON file and never mutate
//! afterwards. A question's index in the file is its sole identity; lookups
//! wrap modulo the set length so a player's cursor can rotate through the
//! set forever.

use log::info;
use shared::Question;
use std::path::Path;
use thiserror::Error;

/// Fatal startup errors from question-set loading.
///
/// None of these are recoverable at runtime: the server refuses to start
/// without a readable, well-formed, non-empty question file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read question file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse question file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("question set is empty")]
    Empty,
}

/// Immutable ordered sequence of questions.
///
/// Construction rejects an empty sequence, so [`QuestionSet::get`] is total:
/// every index maps to a question via modulo arithmetic.
#[derive(Debug)]
pub struct QuestionSet {
    questions: Vec<Question>,
}

impl QuestionSet {
    pub fn new(questions: Vec<Question>) -> Result<Self, ConfigError> {
        if questions.is_empty() {
            return Err(ConfigError::Empty);
        }
        Ok(Self { questions })
    }

    /// Parses a JSON array of questions from an in-memory string.
    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        let questions: Vec<Question> = serde_json::from_str(data)?;
        Self::new(questions)
    }

    /// Loads the question file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let set = Self::from_json(&data)?;
        info!("Loaded {} questions from {}", set.len(), path.display());
        Ok(set)
    }

    /// Returns the question at `index % len`.
    pub fn get(&self, index: usize) -> &Question {
        &self.questions[index % self.questions.len()]
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false: empty sets are rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_question_set() -> QuestionSet {
        QuestionSet::from_json(
            r#"[
                {"prompt": "Q0", "choices": ["A", "B"], "points": {"A": 5}},
                {"prompt": "Q1", "choices": ["A", "B"], "points": {"B": 3}},
                {"prompt": "Q2", "choices": ["A", "B"], "points": {"A": 2, "B": 1}}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_get_wraps_modulo_length() {
        let set = three_question_set();
        assert_eq!(set.len(), 3);
        assert_eq!(set.get(0), set.get(3));
        assert_eq!(set.get(0), set.get(6));
        assert_eq!(set.get(1).prompt, "Q1");
        assert_eq!(set.get(5).prompt, "Q2");
    }

    #[test]
    fn test_empty_set_is_rejected() {
        let result = QuestionSet::from_json("[]");
        assert!(matches!(result, Err(ConfigError::Empty)));
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        assert!(matches!(
            QuestionSet::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));

        // A point table that is not a mapping.
        assert!(matches!(
            QuestionSet::from_json(r#"[{"prompt": "Q", "choices": [], "points": 5}]"#),
            Err(ConfigError::Parse(_))
        ));

        // Missing fields.
        assert!(matches!(
            QuestionSet::from_json(r#"[{"prompt": "Q"}]"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let result = QuestionSet::load("/nonexistent/questions.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join("quizcast_test_questions.json");
        std::fs::write(
            &path,
            r#"[{"prompt": "Only question", "choices": ["A"], "points": {"A": 1}}]"#,
        )
        .unwrap();

        let set = QuestionSet::load(&path).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(0).prompt, "Only question");

        std::fs::remove_file(&path).ok();
    }
}
