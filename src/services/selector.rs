// src/services/selector.rs

use rand::{Rng, seq::SliceRandom};

use crate::{
    error::AppError,
    models::question::Question,
    sheets::{SheetStore, Table},
};

fn same_pool(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Builds the paper for `department` out of the whole question bank.
///
/// Common-pool questions come first, then the department's own; each question
/// lands in at most one group. Options are shuffled per question, then the
/// whole list is shuffled.
pub fn select_from<R>(
    bank: Vec<Question>,
    department: &str,
    default_pool: &str,
    rng: &mut R,
) -> Vec<Question>
where
    R: Rng + ?Sized,
{
    let mut common = Vec::new();
    let mut specific = Vec::new();
    for question in bank {
        if question.department.trim().is_empty() || same_pool(&question.department, default_pool) {
            common.push(question);
        } else if same_pool(&question.department, department) {
            specific.push(question);
        }
    }

    let mut paper = common;
    paper.extend(specific);

    for question in &mut paper {
        question.options.shuffle(rng);
    }
    paper.shuffle(rng);
    paper
}

/// Re-reads the question bank and builds a freshly shuffled paper.
pub async fn select_questions(
    store: &dyn SheetStore,
    department: &str,
    default_pool: &str,
) -> Result<Vec<Question>, AppError> {
    let sheet = store.read_table(Table::Questions).await.map_err(|e| {
        tracing::error!("Failed to fetch questions: {:?}", e);
        AppError::from(e)
    })?;
    let bank = Question::load_all(&sheet, default_pool)?;

    Ok(select_from(bank, department, default_pool, &mut rand::rng()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::HashSet;

    fn question(id: &str, department: &str) -> Question {
        Question {
            id: id.to_string(),
            department: department.to_string(),
            text: format!("Question {id}"),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            answer: "A".to_string(),
        }
    }

    fn bank() -> Vec<Question> {
        vec![
            question("A1", "Aptitude"),
            question("A2", "aptitude "),
            question("A3", ""),
            question("C1", "CSE"),
            question("C2", "cse"),
            question("E1", "ECE"),
        ]
    }

    fn ids(paper: &[Question]) -> HashSet<String> {
        paper.iter().map(|q| q.id.clone()).collect()
    }

    #[test]
    fn test_common_plus_department() {
        let mut rng = StdRng::seed_from_u64(7);
        let paper = select_from(bank(), "Cse", "Aptitude", &mut rng);

        assert_eq!(paper.len(), 5);
        let expected: HashSet<String> =
            ["A1", "A2", "A3", "C1", "C2"].iter().map(|s| s.to_string()).collect();
        assert_eq!(ids(&paper), expected);
    }

    #[test]
    fn test_unknown_department_gets_common_only() {
        let mut rng = StdRng::seed_from_u64(7);
        let paper = select_from(bank(), "MECH", "Aptitude", &mut rng);
        assert_eq!(ids(&paper).len(), 3);
        assert!(paper.iter().all(|q| q.id.starts_with('A')));
    }

    #[test]
    fn test_default_pool_department_has_no_duplicates() {
        let mut rng = StdRng::seed_from_u64(1);
        let paper = select_from(bank(), "APTITUDE", "Aptitude", &mut rng);
        assert_eq!(paper.len(), 3);
        assert_eq!(ids(&paper).len(), 3);
    }

    #[test]
    fn test_each_question_once_for_many_draws() {
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let paper = select_from(bank(), "ECE", "Aptitude", &mut rng);
            assert_eq!(paper.len(), 4);
            assert_eq!(ids(&paper).len(), 4);
        }
    }

    #[test]
    fn test_options_are_permuted_not_altered() {
        let mut rng = StdRng::seed_from_u64(42);
        let paper = select_from(bank(), "CSE", "Aptitude", &mut rng);
        for q in &paper {
            let mut options = q.options.clone();
            options.sort();
            assert_eq!(options, vec!["A", "B", "C", "D"]);
            assert_eq!(q.answer, "A");
        }
    }

    #[tokio::test]
    async fn test_select_questions_reads_store_every_call() {
        use crate::sheets::InMemorySheetStore;

        let store = InMemorySheetStore::new().with_table(
            Table::Questions,
            &["QID", "Department", "Question", "Option1", "Option2", "Option3", "Option4", "Answer"],
            &[
                &["Q1", "", "Capital of France?", "Paris", "Rome", "Oslo", "Bern", "Paris"],
                &["Q2", "CSE", "Bits in a byte?", "8", "4", "16", "2", "8"],
            ],
        );

        let first = select_questions(&store, "CSE", "Aptitude").await.unwrap();
        let second = select_questions(&store, "ECE", "Aptitude").await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 1);
        assert_eq!(store.read_count(), 2);
    }
}
