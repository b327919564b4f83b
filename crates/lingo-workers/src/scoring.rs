//! Quiz scoring consumer.
//!
//! Grades a submitted attempt against the quiz's answer key and records the
//! score as a one-way IN_PROGRESS → SCORED transition. Redelivered
//! submissions find the attempt already scored and stop before publishing,
//! so the learner gets exactly one result notification per attempt.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use lingo_core::events::{NotificationEvent, QuizSubmissionEvent, SubmittedAnswer};
use lingo_core::{AttemptRepository, Error, Question, QuestionResult, Result};
use lingo_fabric::topology::NOTIFICATION_EXCHANGE;
use lingo_fabric::{Broker, Envelope};

use crate::consumer::EventHandler;

pub struct ScoringConsumer {
    attempts: Arc<dyn AttemptRepository>,
    broker: Broker,
}

impl ScoringConsumer {
    pub fn new(attempts: Arc<dyn AttemptRepository>, broker: Broker) -> Self {
        Self { attempts, broker }
    }
}

#[async_trait]
impl EventHandler for ScoringConsumer {
    fn name(&self) -> &'static str {
        "scoring"
    }

    async fn handle(&self, envelope: &Envelope) -> Result<()> {
        let event: QuizSubmissionEvent = envelope.decode()?;

        let attempt = self
            .attempts
            .get(event.attempt_id)
            .await?
            .ok_or(Error::AttemptNotFound(event.attempt_id))?;

        if attempt.user_id != event.user_id {
            return Err(Error::InvalidInput(format!(
                "attempt {} does not belong to user {}",
                event.attempt_id, event.user_id
            )));
        }

        let answer_key = self.attempts.answer_key(attempt.quiz_id).await?;
        let (score, results) = grade(&answer_key, &event.answers);

        let recorded = self
            .attempts
            .record_score(event.attempt_id, score, &results)
            .await?;
        if !recorded {
            // Terminal state already reached by an earlier delivery; do not
            // notify again.
            info!(
                attempt_id = %event.attempt_id,
                "Attempt already scored, skipping"
            );
            return Ok(());
        }

        info!(
            attempt_id = %event.attempt_id,
            user_id = %event.user_id,
            score,
            question_count = answer_key.len(),
            "Attempt scored"
        );

        let quiz_title = self
            .attempts
            .quiz_title(attempt.quiz_id)
            .await?
            .unwrap_or_else(|| "Quiz".to_string());

        let result_event = NotificationEvent::QuizResult {
            recipient_id: event.user_id,
            attempt_id: event.attempt_id,
            quiz_title,
            score,
        };
        self.broker.publish(
            NOTIFICATION_EXCHANGE,
            result_event.routing_key(),
            &result_event,
        )?;
        Ok(())
    }
}

/// Grade every question in the answer key against the submitted answers.
/// Unanswered questions score zero.
fn grade(answer_key: &[Question], answers: &[SubmittedAnswer]) -> (i32, Vec<QuestionResult>) {
    let mut score = 0;
    let mut results = Vec::with_capacity(answer_key.len());

    for question in answer_key {
        let answer = answers.iter().find(|a| a.question_id == question.id);
        let correct = answer.is_some_and(|a| is_correct(question, a));
        let points_awarded = if correct { question.points } else { 0 };
        score += points_awarded;

        debug!(
            question_id = %question.id,
            correct,
            points_awarded,
            "Graded question"
        );
        results.push(QuestionResult {
            question_id: question.id,
            correct,
            points_awarded,
        });
    }

    (score, results)
}

fn is_correct(question: &Question, answer: &SubmittedAnswer) -> bool {
    if question.question_type.is_choice_based() {
        match (question.correct_choice(), answer.choice_id) {
            (Some(correct), Some(chosen)) => correct.id == chosen,
            _ => false,
        }
    } else {
        match (question.correct_answer.as_deref(), answer.answer_text.as_deref()) {
            (Some(expected), Some(given)) => {
                expected.trim().eq_ignore_ascii_case(given.trim())
            }
            _ => false,
        }
    }
}
