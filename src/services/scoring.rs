// src/services/scoring.rs

use std::collections::HashMap;

use crate::{
    error::AppError,
    models::{answers::Answers, question::Question},
    sheets::SheetStore,
};

use super::selector::select_questions;

/// Case-folded text with surrounding and repeated whitespace removed.
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Counts the questions whose chosen option matches the stored answer.
///
/// Answers for unknown question ids are ignored; blank choices never count.
pub fn score_answers(answers: &Answers, questions: &[Question]) -> usize {
    let chosen: HashMap<&str, String> = answers
        .iter()
        .map(|(qid, choice)| (qid.trim(), normalize(choice)))
        .collect();

    questions
        .iter()
        .filter(|q| match chosen.get(q.id.as_str()) {
            Some(choice) if !choice.is_empty() => *choice == normalize(&q.answer),
            _ => false,
        })
        .count()
}

/// Scores `answers` against a freshly derived paper for `department`.
pub async fn calculate_score(
    store: &dyn SheetStore,
    answers: &Answers,
    department: &str,
    default_pool: &str,
) -> Result<usize, AppError> {
    let questions = select_questions(store, department, default_pool).await?;
    Ok(score_answers(answers, &questions))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, answer: &str) -> Question {
        Question {
            id: id.to_string(),
            department: "Aptitude".to_string(),
            text: String::new(),
            options: Vec::new(),
            answer: answer.to_string(),
        }
    }

    fn answers(pairs: &[(&str, &str)]) -> Answers {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_score_perfect() {
        let questions = vec![question("Q1", "Paris"), question("Q2", "8")];
        let score = score_answers(&answers(&[("Q1", "Paris"), ("Q2", "8")]), &questions);
        assert_eq!(score, 2);
    }

    #[test]
    fn test_score_ignores_case_and_whitespace() {
        let questions = vec![question("Q1", "New  Delhi "), question("Q2", "TRUE")];
        let score = score_answers(&answers(&[("Q1", " new delhi"), ("Q2", "true")]), &questions);
        assert_eq!(score, 2);
    }

    #[test]
    fn test_blank_choice_never_scores() {
        // A question whose stored answer is blank must not be won by a blank choice.
        let questions = vec![question("Q1", ""), question("Q2", "A")];
        let score = score_answers(&answers(&[("Q1", "  "), ("Q2", "")]), &questions);
        assert_eq!(score, 0);
    }

    #[test]
    fn test_missing_and_unknown_ids() {
        let questions = vec![question("Q1", "A"), question("Q2", "B")];
        let score = score_answers(&answers(&[("Q2", "B"), ("Q9", "A")]), &questions);
        assert_eq!(score, 1);
    }

    #[test]
    fn test_score_zero() {
        let questions = vec![question("Q1", "A")];
        assert_eq!(score_answers(&answers(&[("Q1", "B")]), &questions), 0);
        assert_eq!(score_answers(&Answers::new(), &questions), 0);
    }
}
