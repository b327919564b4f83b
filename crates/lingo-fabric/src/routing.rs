//! Topic routing-key pattern matching.
//!
//! Patterns are dot-separated segments where `*` matches exactly one
//! segment and `#` matches zero or more segments, matching AMQP topic
//! exchange semantics.

/// True when `key` matches the binding `pattern`.
pub fn topic_matches(pattern: &str, key: &str) -> bool {
    let pattern: Vec<&str> = pattern.split('.').collect();
    let key: Vec<&str> = key.split('.').collect();
    segments_match(&pattern, &key)
}

fn segments_match(pattern: &[&str], key: &[&str]) -> bool {
    match (pattern.first(), key.first()) {
        (None, None) => true,
        (Some(&"#"), _) => {
            // `#` absorbs zero segments, or one and stays.
            segments_match(&pattern[1..], key)
                || (!key.is_empty() && segments_match(pattern, &key[1..]))
        }
        (Some(&"*"), Some(_)) => segments_match(&pattern[1..], &key[1..]),
        (Some(p), Some(k)) if p == k => segments_match(&pattern[1..], &key[1..]),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(topic_matches("quiz.submission", "quiz.submission"));
        assert!(!topic_matches("quiz.submission", "quiz.result"));
        assert!(!topic_matches("quiz.submission", "quiz"));
        assert!(!topic_matches("quiz.submission", "quiz.submission.extra"));
    }

    #[test]
    fn test_hash_matches_zero_or_more_segments() {
        assert!(topic_matches("notification.#", "notification.reply.new"));
        assert!(topic_matches("notification.#", "notification.reminder.review"));
        assert!(topic_matches("notification.#", "notification"));
        assert!(!topic_matches("notification.#", "quiz.submission"));
    }

    #[test]
    fn test_star_matches_exactly_one_segment() {
        assert!(topic_matches("notification.*.new", "notification.reply.new"));
        assert!(!topic_matches("notification.*", "notification.reply.new"));
        assert!(!topic_matches("notification.*", "notification"));
    }

    #[test]
    fn test_hash_in_the_middle() {
        assert!(topic_matches("a.#.z", "a.z"));
        assert!(topic_matches("a.#.z", "a.b.c.z"));
        assert!(!topic_matches("a.#.z", "a.b.c"));
    }

    #[test]
    fn test_bare_hash_matches_everything() {
        assert!(topic_matches("#", "anything"));
        assert!(topic_matches("#", "a.b.c"));
    }
}
