//! Post-exam review rows.

use serde::Serialize;

use crate::error::ExamError;
use crate::session::{ExamSession, SessionStatus};

/// An option as shown in the review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionChoice {
    pub key: String,
    pub text: String,
}

/// What the user picked for a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChosenAnswer {
    NotAnswered,
    Chosen(OptionChoice),
}

/// Review of one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewItem {
    /// 1-based position in the exam.
    pub number: usize,
    pub question: String,
    pub chosen: ChosenAnswer,
    pub correct: OptionChoice,
    pub is_correct: bool,
    pub explanation: String,
}

/// Build review rows for a submitted session, in presentation order.
pub fn build_review(session: &ExamSession) -> Result<Vec<ReviewItem>, ExamError> {
    if session.status() != SessionStatus::Submitted {
        return Err(ExamError::InvalidTransition {
            action: "review",
            status: session.status(),
        });
    }

    let items = session
        .questions()
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let chosen = match session.answer(i) {
                Some(key) => ChosenAnswer::Chosen(OptionChoice {
                    key: key.to_string(),
                    text: q.option_text(key).unwrap_or_default().to_string(),
                }),
                None => ChosenAnswer::NotAnswered,
            };
            ReviewItem {
                number: i + 1,
                question: q.text.clone(),
                is_correct: session.answer(i).is_some_and(|key| q.is_correct(key)),
                chosen,
                correct: OptionChoice {
                    key: q.correct_answer.clone(),
                    text: q
                        .option_text(&q.correct_answer)
                        .unwrap_or_default()
                        .to_string(),
                },
                explanation: q.explanation.clone(),
            }
        })
        .collect();

    Ok(items)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::session::tests::started;

    #[test]
    fn review_requires_submission() {
        let session = started(30, 9);
        assert!(matches!(
            build_review(&session),
            Err(ExamError::InvalidTransition {
                action: "review",
                status: SessionStatus::InProgress
            })
        ));
    }

    #[test]
    fn review_rows_follow_presentation_order() {
        let mut session = started(35, 10);
        let first_correct = session.current_question().correct_answer.clone();
        session.select_answer(&first_correct).unwrap();
        session.next();
        let wrong = if session.current_question().correct_answer == "D" {
            "A"
        } else {
            "D"
        };
        session.select_answer(wrong).unwrap();
        session.submit(Utc::now()).unwrap();

        let review = build_review(&session).unwrap();
        assert_eq!(review.len(), 30);
        for (i, item) in review.iter().enumerate() {
            assert_eq!(item.number, i + 1);
            assert_eq!(item.question, session.questions()[i].text);
            assert_eq!(item.explanation, session.questions()[i].explanation);
        }

        assert!(review[0].is_correct);
        assert_eq!(review[0].chosen, ChosenAnswer::Chosen(review[0].correct.clone()));

        assert!(!review[1].is_correct);
        match &review[1].chosen {
            ChosenAnswer::Chosen(choice) => assert_eq!(choice.key, wrong),
            other => panic!("expected a chosen answer, got {other:?}"),
        }

        assert_eq!(review[2].chosen, ChosenAnswer::NotAnswered);
        assert!(!review[2].is_correct);
    }
}
