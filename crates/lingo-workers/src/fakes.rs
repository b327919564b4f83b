//! In-memory repository fakes for consumer tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use lingo_core::*;

#[derive(Default)]
pub struct FakeUsers {
    users: Mutex<HashMap<Uuid, User>>,
}

impl FakeUsers {
    pub fn add(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.users.lock().unwrap().insert(
            id,
            User {
                id,
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
            },
        );
        id
    }
}

#[async_trait]
impl UserRepository for FakeUsers {
    async fn get(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }
}

#[derive(Default)]
pub struct FakeVocabulary {
    items: Mutex<Vec<Vocabulary>>,
}

impl FakeVocabulary {
    pub fn add(&self, vocab: Vocabulary) -> Uuid {
        let id = vocab.id;
        self.items.lock().unwrap().push(vocab);
        id
    }
}

/// Minimal vocabulary item builder for tests.
pub fn vocab(word: &str) -> Vocabulary {
    Vocabulary {
        id: Uuid::new_v4(),
        word: word.to_string(),
        definition_en: None,
        meaning: None,
        example_en: None,
        part_of_speech: None,
        pronunciation: None,
        image_url: None,
        audio_url: None,
        category_id: None,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl VocabularyRepository for FakeVocabulary {
    async fn get(&self, id: Uuid) -> Result<Option<Vocabulary>> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.id == id)
            .cloned())
    }

    async fn distractors(
        &self,
        exclude_id: Uuid,
        part_of_speech: &str,
        limit: i64,
    ) -> Result<Vec<Vocabulary>> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|v| {
                v.id != exclude_id
                    && v.part_of_speech
                        .as_deref()
                        .is_some_and(|p| p.eq_ignore_ascii_case(part_of_speech))
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct FakeReviews {
    states: Mutex<HashMap<(Uuid, Uuid), ReviewState>>,
    /// Users whose due_count call should fail, for error-isolation tests.
    pub failing_users: Mutex<Vec<Uuid>>,
}

impl FakeReviews {
    pub fn set(&self, state: ReviewState) {
        self.states
            .lock()
            .unwrap()
            .insert((state.user_id, state.vocabulary_id), state);
    }
}

#[async_trait]
impl ReviewRepository for FakeReviews {
    async fn get(&self, user_id: Uuid, vocabulary_id: Uuid) -> Result<Option<ReviewState>> {
        Ok(self
            .states
            .lock()
            .unwrap()
            .get(&(user_id, vocabulary_id))
            .cloned())
    }

    async fn upsert(&self, state: &ReviewState) -> Result<()> {
        self.set(state.clone());
        Ok(())
    }

    async fn users_with_due_items(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>> {
        let mut users: Vec<Uuid> = self
            .states
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.next_review_at.is_some_and(|t| t <= now))
            .map(|s| s.user_id)
            .collect();
        users.sort();
        users.dedup();
        Ok(users)
    }

    async fn due_count(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<i64> {
        if self.failing_users.lock().unwrap().contains(&user_id) {
            return Err(Error::Internal("simulated failure".into()));
        }
        Ok(self
            .states
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.user_id == user_id && s.next_review_at.is_some_and(|t| t <= now))
            .count() as i64)
    }
}

#[derive(Default)]
pub struct FakeNotifications {
    notifications: Mutex<Vec<Notification>>,
    seen_keys: Mutex<Vec<(Uuid, NotificationKind, String)>>,
}

impl FakeNotifications {
    pub fn all(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationRepository for FakeNotifications {
    async fn insert_deduplicated(&self, new: NewNotification) -> Result<Option<Notification>> {
        let key = (new.recipient_id, new.kind, new.reference_key.clone());
        let mut seen = self.seen_keys.lock().unwrap();
        if seen.contains(&key) {
            return Ok(None);
        }
        seen.push(key);
        let mut notifications = self.notifications.lock().unwrap();
        let notification = Notification {
            id: Uuid::now_v7(),
            recipient_id: new.recipient_id,
            actor_id: new.actor_id,
            kind: new.kind,
            message: new.message,
            link: new.link,
            read: false,
            created_at: Utc::now(),
        };
        notifications.push(notification.clone());
        Ok(Some(notification))
    }

    async fn list_for_recipient(
        &self,
        recipient_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>> {
        let mut list: Vec<Notification> = self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn mark_read(&self, id: Uuid, recipient_id: Uuid) -> Result<()> {
        let mut notifications = self.notifications.lock().unwrap();
        match notifications
            .iter_mut()
            .find(|n| n.id == id && n.recipient_id == recipient_id)
        {
            Some(n) => {
                n.read = true;
                Ok(())
            }
            None => Err(Error::NotFound(format!("notification {id}"))),
        }
    }

    async fn unread_count(&self, recipient_id: Uuid) -> Result<i64> {
        Ok(self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.recipient_id == recipient_id && !n.read)
            .count() as i64)
    }
}

#[derive(Default)]
pub struct FakeQuizzes {
    quizzes: Mutex<Vec<Quiz>>,
}

impl FakeQuizzes {
    pub fn created(&self) -> Vec<Quiz> {
        self.quizzes.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuizRepository for FakeQuizzes {
    async fn create(&self, new: NewQuiz) -> Result<Quiz> {
        let quiz = Quiz {
            id: Uuid::now_v7(),
            title: new.title,
            description: new.description,
            category_id: new.category_id,
            questions: new
                .questions
                .into_iter()
                .map(|q| Question {
                    id: Uuid::now_v7(),
                    question_type: q.question_type,
                    prompt: q.prompt,
                    audio_url: q.audio_url,
                    image_url: q.image_url,
                    correct_answer: q.correct_answer,
                    points: q.points,
                    related_vocabulary_id: q.related_vocabulary_id,
                    choices: q
                        .choices
                        .into_iter()
                        .map(|c| Choice {
                            id: Uuid::now_v7(),
                            content: c.content,
                            image_url: c.image_url,
                            is_correct: c.is_correct,
                        })
                        .collect(),
                })
                .collect(),
            created_at: Utc::now(),
        };
        self.quizzes.lock().unwrap().push(quiz.clone());
        Ok(quiz)
    }
}

#[derive(Default)]
pub struct FakeAttempts {
    attempts: Mutex<HashMap<Uuid, QuizAttempt>>,
    questions: Mutex<HashMap<Uuid, Vec<Question>>>,
    titles: Mutex<HashMap<Uuid, String>>,
    pub recorded: Mutex<Vec<(Uuid, i32, Vec<QuestionResult>)>>,
}

impl FakeAttempts {
    pub fn add_quiz(&self, quiz_id: Uuid, title: &str, questions: Vec<Question>) {
        self.questions.lock().unwrap().insert(quiz_id, questions);
        self.titles.lock().unwrap().insert(quiz_id, title.to_string());
    }

    pub fn add_attempt(&self, quiz_id: Uuid, user_id: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        self.attempts.lock().unwrap().insert(
            id,
            QuizAttempt {
                id,
                quiz_id,
                user_id,
                status: AttemptStatus::InProgress,
                score: 0,
                started_at: Utc::now(),
                completed_at: None,
            },
        );
        id
    }
}

#[async_trait]
impl AttemptRepository for FakeAttempts {
    async fn get(&self, id: Uuid) -> Result<Option<QuizAttempt>> {
        Ok(self.attempts.lock().unwrap().get(&id).cloned())
    }

    async fn answer_key(&self, quiz_id: Uuid) -> Result<Vec<Question>> {
        Ok(self
            .questions
            .lock()
            .unwrap()
            .get(&quiz_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn quiz_title(&self, quiz_id: Uuid) -> Result<Option<String>> {
        Ok(self.titles.lock().unwrap().get(&quiz_id).cloned())
    }

    async fn record_score(
        &self,
        attempt_id: Uuid,
        score: i32,
        results: &[QuestionResult],
    ) -> Result<bool> {
        let mut attempts = self.attempts.lock().unwrap();
        let attempt = attempts
            .get_mut(&attempt_id)
            .ok_or(Error::AttemptNotFound(attempt_id))?;
        if attempt.status == AttemptStatus::Scored {
            return Ok(false);
        }
        attempt.status = AttemptStatus::Scored;
        attempt.score = score;
        attempt.completed_at = Some(Utc::now());
        self.recorded
            .lock()
            .unwrap()
            .push((attempt_id, score, results.to_vec()));
        Ok(true)
    }
}
