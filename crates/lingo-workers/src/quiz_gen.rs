//! Quiz auto-generation consumer.
//!
//! Reacts to vocabulary creation by assembling a practice quiz from four
//! independent question strategies. Each strategy abstains when the item
//! lacks the assets it needs (example sentence, definition, image, audio)
//! or when too few same-part-of-speech distractors exist; a quiz is only
//! created from the questions that made the cut. Zero viable questions is
//! a normal outcome, not an error.

use std::sync::Arc;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use lingo_core::defaults::{BLANK_PLACEHOLDER, MIN_DISTRACTORS, QUESTION_POINTS};
use lingo_core::{
    Error, NewChoice, NewQuestion, NewQuiz, QuestionType, QuizRepository, Result, Vocabulary,
    VocabularyRepository,
};
use lingo_fabric::Envelope;

use crate::consumer::EventHandler;

/// Distractor candidates fetched per event; strategies filter further.
const DISTRACTOR_POOL: i64 = 12;

pub struct QuizGenerator {
    vocabulary: Arc<dyn VocabularyRepository>,
    quizzes: Arc<dyn QuizRepository>,
}

impl QuizGenerator {
    pub fn new(vocabulary: Arc<dyn VocabularyRepository>, quizzes: Arc<dyn QuizRepository>) -> Self {
        Self { vocabulary, quizzes }
    }
}

#[async_trait]
impl EventHandler for QuizGenerator {
    fn name(&self) -> &'static str {
        "quiz_gen"
    }

    async fn handle(&self, envelope: &Envelope) -> Result<()> {
        let event: lingo_core::events::ContentCreatedEvent = envelope.decode()?;

        let vocab = self
            .vocabulary
            .get(event.vocabulary_id)
            .await?
            .ok_or(Error::VocabularyNotFound(event.vocabulary_id))?;

        let distractors = match vocab.part_of_speech.as_deref() {
            Some(pos) => {
                self.vocabulary
                    .distractors(vocab.id, pos, DISTRACTOR_POOL)
                    .await?
            }
            None => Vec::new(),
        };

        let questions: Vec<NewQuestion> = [
            fill_in_blank(&vocab),
            multiple_choice_text(&vocab, &distractors),
            multiple_choice_image(&vocab, &distractors),
            listening_comprehension(&vocab, &distractors),
        ]
        .into_iter()
        .flatten()
        .collect();

        if questions.is_empty() {
            info!(
                vocabulary_id = %vocab.id,
                word = %vocab.word,
                "No question strategy viable, skipping quiz generation"
            );
            return Ok(());
        }

        let question_count = questions.len();
        let quiz = self
            .quizzes
            .create(NewQuiz {
                title: format!("Practice: {}", vocab.word),
                description: Some(format!(
                    "Auto-generated practice questions for \"{}\"",
                    vocab.word
                )),
                category_id: vocab.category_id,
                questions,
            })
            .await?;

        info!(
            vocabulary_id = %vocab.id,
            quiz_id = %quiz.id,
            question_count,
            "Generated quiz"
        );
        Ok(())
    }
}

/// Blank the word out of its example sentence and ask the learner to type
/// it back. Abstains when the example does not actually contain the word.
fn fill_in_blank(vocab: &Vocabulary) -> Option<NewQuestion> {
    if !vocab.has_usable_example() {
        return None;
    }
    let example = vocab.example_en.as_deref()?;
    let prompt = blank_out(example, &vocab.word)?;

    Some(NewQuestion {
        question_type: QuestionType::FillInBlank,
        prompt,
        audio_url: None,
        image_url: None,
        correct_answer: Some(vocab.word.clone()),
        points: QUESTION_POINTS,
        related_vocabulary_id: Some(vocab.id),
        choices: Vec::new(),
    })
}

/// Replace every case-insensitive occurrence of the word with the blank
/// placeholder. A sentence using the word twice must not leave the answer
/// visible elsewhere in the prompt.
fn blank_out(example: &str, word: &str) -> Option<String> {
    let lower_example = example.to_lowercase();
    let lower_word = word.to_lowercase();
    if lower_word.is_empty() || !lower_example.contains(&lower_word) {
        return None;
    }
    // Offsets come from the lowercased copy; when lowercasing shifts byte
    // positions (rare scripts), abstain rather than splice mid-character.
    if lower_example.len() != example.len() {
        return None;
    }

    let mut prompt = String::with_capacity(example.len());
    let mut rest = 0;
    let mut search = 0;
    while let Some(found) = lower_example[search..].find(&lower_word) {
        let start = search + found;
        let end = start + lower_word.len();
        if !example.is_char_boundary(start) || !example.is_char_boundary(end) {
            return None;
        }
        prompt.push_str(&example[rest..start]);
        prompt.push_str(BLANK_PLACEHOLDER);
        rest = end;
        search = end;
    }
    prompt.push_str(&example[rest..]);
    Some(prompt)
}

/// The blanked example sentence answered by choosing among words, with
/// same-part-of-speech distractors. Gated on the example sentence, like
/// fill-in-blank; the two differ only in answer mode.
fn multiple_choice_text(vocab: &Vocabulary, distractors: &[Vocabulary]) -> Option<NewQuestion> {
    if !vocab.has_usable_example() {
        return None;
    }
    let example = vocab.example_en.as_deref()?;
    let blanked = blank_out(example, &vocab.word)?;
    let picked = pick_distractors(distractors, |_| true)?;

    let choices = build_choices(
        NewChoice {
            content: Some(vocab.word.clone()),
            image_url: None,
            is_correct: true,
        },
        picked.iter().map(|d| NewChoice {
            content: Some(d.word.clone()),
            image_url: None,
            is_correct: false,
        }),
    );

    Some(NewQuestion {
        question_type: QuestionType::MultipleChoiceText,
        prompt: format!("Fill in the blanks: {blanked}"),
        audio_url: None,
        image_url: None,
        correct_answer: None,
        points: QUESTION_POINTS,
        related_vocabulary_id: Some(vocab.id),
        choices,
    })
}

/// "Which image matches this definition?" Needs both an image and a
/// definition on the item itself, plus images on every distractor used.
fn multiple_choice_image(vocab: &Vocabulary, distractors: &[Vocabulary]) -> Option<NewQuestion> {
    let image_url = vocab.image_url.as_deref().filter(|s| !s.trim().is_empty())?;
    let definition = vocab
        .definition_en
        .as_deref()
        .filter(|s| !s.trim().is_empty())?;
    let picked = pick_distractors(distractors, |d| {
        d.image_url.as_deref().is_some_and(|s| !s.trim().is_empty())
    })?;

    let choices = build_choices(
        NewChoice {
            content: None,
            image_url: Some(image_url.to_string()),
            is_correct: true,
        },
        picked.iter().map(|d| NewChoice {
            content: None,
            image_url: d.image_url.clone(),
            is_correct: false,
        }),
    );

    Some(NewQuestion {
        question_type: QuestionType::MultipleChoiceImage,
        prompt: format!("Which image matches this definition? {definition}"),
        audio_url: None,
        image_url: None,
        correct_answer: None,
        points: QUESTION_POINTS,
        related_vocabulary_id: Some(vocab.id),
        choices,
    })
}

/// "Listen and pick the word you hear." Needs pronunciation audio.
fn listening_comprehension(vocab: &Vocabulary, distractors: &[Vocabulary]) -> Option<NewQuestion> {
    let audio_url = vocab.audio_url.as_deref().filter(|s| !s.trim().is_empty())?;
    let picked = pick_distractors(distractors, |_| true)?;

    let choices = build_choices(
        NewChoice {
            content: Some(vocab.word.clone()),
            image_url: None,
            is_correct: true,
        },
        picked.iter().map(|d| NewChoice {
            content: Some(d.word.clone()),
            image_url: None,
            is_correct: false,
        }),
    );

    Some(NewQuestion {
        question_type: QuestionType::ListeningComprehension,
        prompt: "Listen and choose the word you hear".to_string(),
        audio_url: Some(audio_url.to_string()),
        image_url: None,
        correct_answer: None,
        points: QUESTION_POINTS,
        related_vocabulary_id: Some(vocab.id),
        choices,
    })
}

/// Filter the pool and take the required distractor count, abstaining when
/// the catalog is too thin.
fn pick_distractors<'a>(
    pool: &'a [Vocabulary],
    predicate: impl Fn(&Vocabulary) -> bool,
) -> Option<Vec<&'a Vocabulary>> {
    let picked: Vec<&Vocabulary> = pool
        .iter()
        .filter(|d| predicate(d))
        .take(MIN_DISTRACTORS)
        .collect();
    (picked.len() >= MIN_DISTRACTORS).then_some(picked)
}

/// Shuffle the correct choice in among the distractors so position carries
/// no signal.
fn build_choices(
    correct: NewChoice,
    distractors: impl Iterator<Item = NewChoice>,
) -> Vec<NewChoice> {
    let mut choices: Vec<NewChoice> = std::iter::once(correct).chain(distractors).collect();
    choices.shuffle(&mut rand::thread_rng());
    debug!(choice_count = choices.len(), "Built choice set");
    choices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{vocab, FakeQuizzes, FakeVocabulary};
    use chrono::Utc;
    use lingo_core::events::ContentCreatedEvent;
    use uuid::Uuid;

    fn envelope_for(vocabulary_id: Uuid) -> Envelope {
        Envelope {
            message_id: Uuid::now_v7(),
            routing_key: ContentCreatedEvent::ROUTING_KEY.to_string(),
            payload: serde_json::to_value(ContentCreatedEvent { vocabulary_id }).unwrap(),
            published_at: Utc::now(),
        }
    }

    fn rich_vocab(word: &str) -> Vocabulary {
        let mut v = vocab(word);
        v.definition_en = Some(format!("definition of {word}"));
        v.example_en = Some(format!("A sentence featuring {word} prominently."));
        v.part_of_speech = Some("noun".to_string());
        v.image_url = Some(format!("https://cdn.example.com/{word}.png"));
        v.audio_url = Some(format!("https://cdn.example.com/{word}.mp3"));
        v
    }

    fn generator() -> (Arc<FakeVocabulary>, Arc<FakeQuizzes>, QuizGenerator) {
        let vocabulary = Arc::new(FakeVocabulary::default());
        let quizzes = Arc::new(FakeQuizzes::default());
        let generator = QuizGenerator::new(vocabulary.clone(), quizzes.clone());
        (vocabulary, quizzes, generator)
    }

    #[tokio::test]
    async fn test_full_catalog_yields_all_four_strategies() {
        let (vocabulary, quizzes, generator) = generator();
        let id = vocabulary.add(rich_vocab("lantern"));
        for word in ["bridge", "harbor", "orchard"] {
            vocabulary.add(rich_vocab(word));
        }

        generator.handle(&envelope_for(id)).await.unwrap();

        let created = quizzes.created();
        assert_eq!(created.len(), 1);
        let quiz = &created[0];
        assert_eq!(quiz.title, "Practice: lantern");
        assert_eq!(quiz.questions.len(), 4);

        let types: Vec<QuestionType> =
            quiz.questions.iter().map(|q| q.question_type).collect();
        assert!(types.contains(&QuestionType::FillInBlank));
        assert!(types.contains(&QuestionType::MultipleChoiceText));
        assert!(types.contains(&QuestionType::MultipleChoiceImage));
        assert!(types.contains(&QuestionType::ListeningComprehension));

        for question in &quiz.questions {
            assert_eq!(question.points, QUESTION_POINTS);
            assert_eq!(question.related_vocabulary_id, Some(id));
            if question.question_type.is_choice_based() {
                assert_eq!(question.choices.len(), 1 + MIN_DISTRACTORS);
                assert_eq!(
                    question.choices.iter().filter(|c| c.is_correct).count(),
                    1
                );
            }
        }
    }

    #[tokio::test]
    async fn test_blank_replacement_is_case_insensitive() {
        let (vocabulary, quizzes, generator) = generator();
        let mut v = vocab("Ephemeral");
        v.example_en = Some("Fame is ephemeral at best.".to_string());
        let id = vocabulary.add(v);

        generator.handle(&envelope_for(id)).await.unwrap();

        let quiz = &quizzes.created()[0];
        let fib = &quiz.questions[0];
        assert_eq!(fib.question_type, QuestionType::FillInBlank);
        assert_eq!(fib.prompt, format!("Fame is {BLANK_PLACEHOLDER} at best."));
        assert_eq!(fib.correct_answer.as_deref(), Some("Ephemeral"));
    }

    #[tokio::test]
    async fn test_too_few_distractors_abstains_choice_strategies() {
        let (vocabulary, quizzes, generator) = generator();
        let id = vocabulary.add(rich_vocab("lantern"));
        // Only two same-POS distractors in the catalog.
        vocabulary.add(rich_vocab("bridge"));
        vocabulary.add(rich_vocab("harbor"));

        generator.handle(&envelope_for(id)).await.unwrap();

        let quiz = &quizzes.created()[0];
        assert_eq!(quiz.questions.len(), 1);
        assert_eq!(quiz.questions[0].question_type, QuestionType::FillInBlank);
    }

    #[tokio::test]
    async fn test_image_strategy_needs_image_bearing_distractors() {
        let (vocabulary, quizzes, generator) = generator();
        let id = vocabulary.add(rich_vocab("lantern"));
        for word in ["bridge", "harbor", "orchard"] {
            let mut d = rich_vocab(word);
            d.image_url = None;
            vocabulary.add(d);
        }

        generator.handle(&envelope_for(id)).await.unwrap();

        let quiz = &quizzes.created()[0];
        let types: Vec<QuestionType> =
            quiz.questions.iter().map(|q| q.question_type).collect();
        assert!(!types.contains(&QuestionType::MultipleChoiceImage));
        assert!(types.contains(&QuestionType::MultipleChoiceText));
        assert!(types.contains(&QuestionType::ListeningComprehension));
    }

    #[tokio::test]
    async fn test_text_choice_gated_on_example_not_definition() {
        let (vocabulary, quizzes, generator) = generator();
        let mut v = vocab("lantern");
        v.example_en = Some("The lantern swung in the wind.".to_string());
        v.part_of_speech = Some("noun".to_string());
        let id = vocabulary.add(v);
        for word in ["bridge", "harbor", "orchard"] {
            vocabulary.add(rich_vocab(word));
        }

        generator.handle(&envelope_for(id)).await.unwrap();

        // No definition, but the example sentence alone carries the word
        // choice question.
        let quiz = &quizzes.created()[0];
        let mc_text = quiz
            .questions
            .iter()
            .find(|q| q.question_type == QuestionType::MultipleChoiceText)
            .expect("example sentence plus distractors should yield a word choice question");
        assert_eq!(
            mc_text.prompt,
            format!("Fill in the blanks: The {BLANK_PLACEHOLDER} swung in the wind.")
        );
    }

    #[tokio::test]
    async fn test_text_choice_abstains_without_example() {
        let (vocabulary, quizzes, generator) = generator();
        let mut v = vocab("lantern");
        v.definition_en = Some("a portable case for a light".to_string());
        v.part_of_speech = Some("noun".to_string());
        let id = vocabulary.add(v);
        for word in ["bridge", "harbor", "orchard"] {
            vocabulary.add(rich_vocab(word));
        }

        generator.handle(&envelope_for(id)).await.unwrap();

        // A definition without an example sentence supports neither of the
        // example-based strategies, and no other asset exists: no quiz.
        assert!(quizzes.created().is_empty());
    }

    #[tokio::test]
    async fn test_image_choice_requires_definition() {
        let (vocabulary, quizzes, generator) = generator();
        let mut v = rich_vocab("lantern");
        v.definition_en = None;
        let id = vocabulary.add(v);
        for word in ["bridge", "harbor", "orchard"] {
            vocabulary.add(rich_vocab(word));
        }

        generator.handle(&envelope_for(id)).await.unwrap();

        // An image without definition text has no prompt to render.
        let quiz = &quizzes.created()[0];
        let types: Vec<QuestionType> =
            quiz.questions.iter().map(|q| q.question_type).collect();
        assert!(!types.contains(&QuestionType::MultipleChoiceImage));
        assert!(types.contains(&QuestionType::MultipleChoiceText));
    }

    #[tokio::test]
    async fn test_bare_item_produces_no_quiz() {
        let (vocabulary, quizzes, generator) = generator();
        let id = vocabulary.add(vocab("spartan"));

        // Zero viable strategies is a clean ack, not an error.
        generator.handle(&envelope_for(id)).await.unwrap();
        assert!(quizzes.created().is_empty());
    }

    #[tokio::test]
    async fn test_missing_vocabulary_is_permanent_error() {
        let (_vocabulary, _quizzes, generator) = generator();
        let err = generator
            .handle(&envelope_for(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(err.is_permanent());
    }

    #[test]
    fn test_blank_out_replaces_every_occurrence() {
        // A repeated word must not leak the answer elsewhere in the prompt.
        let blanked = blank_out("The lantern by the Lantern shop.", "lantern").unwrap();
        assert_eq!(
            blanked,
            format!("The {BLANK_PLACEHOLDER} by the {BLANK_PLACEHOLDER} shop.")
        );
    }

    #[test]
    fn test_blank_out_missing_word() {
        assert!(blank_out("No match here.", "lantern").is_none());
    }
}
