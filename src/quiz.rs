use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::error::{Result, VigilError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    pub choices: Vec<Choice>,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    #[serde(default = "default_title")]
    pub title: String,
    pub questions: Vec<Question>,
}

fn default_title() -> String {
    "Proctored Quiz".to_string()
}

fn question(id: &str, prompt: &str, choices: [&str; 4], answer: &str) -> Question {
    Question {
        id: id.to_string(),
        prompt: prompt.to_string(),
        choices: ["a", "b", "c", "d"]
            .iter()
            .zip(choices)
            .map(|(id, label)| Choice {
                id: id.to_string(),
                label: label.to_string(),
            })
            .collect(),
        answer: answer.to_string(),
    }
}

impl Quiz {
    /// The five-question quiz shipped with the binary
    pub fn builtin() -> Self {
        Self {
            title: default_title(),
            questions: vec![
                question(
                    "q1",
                    "What is the capital of Australia?",
                    ["Sydney", "Canberra", "Melbourne", "Perth"],
                    "b",
                ),
                question(
                    "q2",
                    "Which planet is closest to the Sun?",
                    ["Mercury", "Venus", "Earth", "Mars"],
                    "a",
                ),
                question("q3", "What is 7 × 8?", ["54", "56", "58", "64"], "b"),
                question(
                    "q4",
                    "Which gas do plants primarily absorb from the air?",
                    ["Oxygen", "Nitrogen", "Carbon dioxide", "Helium"],
                    "c",
                ),
                question(
                    "q5",
                    "How many sides does a hexagon have?",
                    ["5", "8", "6", "7"],
                    "c",
                ),
            ],
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let quiz: Quiz = serde_json::from_str(json)?;
        quiz.validate()?;
        Ok(quiz)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.questions.is_empty() {
            return Err(VigilError::InvalidQuiz("quiz has no questions".into()));
        }

        let mut seen = HashSet::new();
        for q in &self.questions {
            if !seen.insert(q.id.as_str()) {
                return Err(VigilError::InvalidQuiz(format!(
                    "duplicate question id '{}'",
                    q.id
                )));
            }
            if q.choices.is_empty() {
                return Err(VigilError::InvalidQuiz(format!(
                    "question '{}' has no choices",
                    q.id
                )));
            }
            if !q.choices.iter().map(|c| &c.id).all_unique() {
                return Err(VigilError::InvalidQuiz(format!(
                    "question '{}' has duplicate choice ids",
                    q.id
                )));
            }
            if !q.choices.iter().any(|c| c.id == q.answer) {
                return Err(VigilError::InvalidQuiz(format!(
                    "answer '{}' of question '{}' is not one of its choices",
                    q.answer, q.id
                )));
            }
        }
        Ok(())
    }

    pub fn key(&self) -> AnswerKey {
        AnswerKey(
            self.questions
                .iter()
                .map(|q| (q.id.clone(), q.answer.clone()))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Question id to correct choice, in question order. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerKey(Vec<(String, String)>);

impl AnswerKey {
    pub fn entries(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Read access to a respondent's selections
pub trait Answers {
    fn selection(&self, question_id: &str) -> Option<&str>;
}

impl Answers for HashMap<String, String> {
    fn selection(&self, question_id: &str) -> Option<&str> {
        self.get(question_id).map(String::as_str)
    }
}

impl Answers for BTreeMap<&str, &str> {
    fn selection(&self, question_id: &str) -> Option<&str> {
        self.get(question_id).copied()
    }
}

/// Zero-or-one selected choice per question
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSheet {
    selections: HashMap<String, String>,
}

impl AnswerSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, question_id: &str, choice_id: &str) {
        self.selections
            .insert(question_id.to_string(), choice_id.to_string());
    }

    pub fn clear(&mut self, question_id: &str) {
        self.selections.remove(question_id);
    }

    pub fn answered(&self) -> usize {
        self.selections.len()
    }
}

impl Answers for AnswerSheet {
    fn selection(&self, question_id: &str) -> Option<&str> {
        self.selections.selection(question_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    pub score: usize,
    pub total: usize,
    /// 1-based, ascending
    pub unanswered: Vec<usize>,
}

impl QuizResult {
    pub fn summary(&self) -> String {
        format!("Quiz Score: {}/{}", self.score, self.total)
    }

    pub fn status(&self) -> String {
        if self.unanswered.is_empty() {
            "Submitted".to_string()
        } else {
            format!("Unanswered: {}", self.unanswered.iter().join(", "))
        }
    }
}

pub fn grade(answers: &impl Answers, key: &AnswerKey) -> QuizResult {
    let mut score = 0;
    let mut unanswered = Vec::new();

    for (idx, (question_id, correct)) in key.entries().iter().enumerate() {
        match answers.selection(question_id) {
            None => unanswered.push(idx + 1),
            Some(selected) if selected == correct => score += 1,
            Some(_) => {}
        }
    }

    QuizResult {
        score,
        total: key.len(),
        unanswered,
    }
}
