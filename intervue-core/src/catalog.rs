use crate::random::{RandomSource, sample_indices, shuffle};
use crate::types::{Difficulty, Question};
use thiserror::Error;

const BUILTIN_CATALOG: &str = include_str!("../assets/questions.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("decode question catalog: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("catalog has {available} {pool} questions, need {required}")]
    NotEnough {
        pool: &'static str,
        available: usize,
        required: usize,
    },
}

/// How many questions of each pool a session draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPlan {
    pub hard: usize,
    // Drawn from the combined easy + mid pool.
    pub other: usize,
}

impl Default for SelectionPlan {
    fn default() -> Self {
        Self { hard: 2, other: 8 }
    }
}

impl SelectionPlan {
    pub fn total(&self) -> usize {
        self.hard + self.other
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
}

impl QuestionCatalog {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let questions: Vec<Question> = serde_json::from_str(raw)?;
        Ok(Self { questions })
    }

    /// The Excel catalog bundled with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Samples `plan.hard` hard questions and `plan.other` easy/mid questions
    /// without replacement, then shuffles the combined list.
    pub fn select(
        &self,
        plan: SelectionPlan,
        rng: &mut dyn RandomSource,
    ) -> Result<Vec<Question>, CatalogError> {
        let hard: Vec<&Question> = self
            .questions
            .iter()
            .filter(|q| q.level == Difficulty::Hard)
            .collect();
        let other: Vec<&Question> = self
            .questions
            .iter()
            .filter(|q| q.level != Difficulty::Hard)
            .collect();

        if hard.len() < plan.hard {
            return Err(CatalogError::NotEnough {
                pool: "hard",
                available: hard.len(),
                required: plan.hard,
            });
        }
        if other.len() < plan.other {
            return Err(CatalogError::NotEnough {
                pool: "easy/mid",
                available: other.len(),
                required: plan.other,
            });
        }

        let mut selected: Vec<Question> = Vec::with_capacity(plan.total());
        for i in sample_indices(rng, hard.len(), plan.hard) {
            selected.push(hard[i].clone());
        }
        for i in sample_indices(rng, other.len(), plan.other) {
            selected.push(other[i].clone());
        }
        shuffle(rng, &mut selected);
        Ok(selected)
    }
}
