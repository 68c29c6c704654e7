use crate::error::Result;
use crate::models::question::QuestionItem;
use crate::services::cache::LruCache;
use crate::services::gemini_service::TextGenerator;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Exact request tuple the memoization table is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PaperKey {
    pub subject: String,
    pub subtopic: String,
    pub level: String,
    pub num_questions: i64,
}

/// Outcome of the two-stage reply parse. `Unrecoverable` is the explicit
/// "return an empty list" branch, never an error surfaced to the caller.
#[derive(Debug, PartialEq)]
pub enum ParseOutcome {
    Parsed(Vec<QuestionItem>),
    Unrecoverable,
}

pub struct PaperService {
    provider: Arc<dyn TextGenerator>,
    cache: Mutex<LruCache<PaperKey, Arc<Vec<QuestionItem>>>>,
    inflight: Mutex<HashMap<PaperKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl PaperService {
    pub fn new(provider: Arc<dyn TextGenerator>, cache_capacity: usize) -> Self {
        Self {
            provider,
            cache: Mutex::new(LruCache::new(cache_capacity)),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Generates the question list for `key`, memoized per exact key.
    ///
    /// Concurrent requests for the same key are funneled through a per-key
    /// lock so the provider is called at most once per cache miss. Replies
    /// that cannot be recovered into a JSON array produce an empty list and
    /// are not cached, so a later identical request retries the provider.
    pub async fn generate_questions(&self, key: &PaperKey) -> Result<Arc<Vec<QuestionItem>>> {
        if let Some(hit) = self.cache.lock().unwrap().get(key) {
            return Ok(hit);
        }

        let gate = {
            let mut inflight = self.inflight.lock().unwrap();
            inflight
                .entry(key.clone())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        let guard = gate.lock().await;

        // Another request may have filled the cache while we waited.
        if let Some(hit) = self.cache.lock().unwrap().get(key) {
            return Ok(hit);
        }

        let result = self.generate_uncached(key).await;

        drop(guard);
        self.inflight.lock().unwrap().remove(key);

        result
    }

    async fn generate_uncached(&self, key: &PaperKey) -> Result<Arc<Vec<QuestionItem>>> {
        let prompt = build_question_prompt(key);
        let raw = self.provider.generate_text(&prompt).await?;

        match parse_question_reply(&raw) {
            ParseOutcome::Parsed(items) => {
                let items = Arc::new(items);
                self.cache.lock().unwrap().insert(key.clone(), items.clone());
                Ok(items)
            }
            ParseOutcome::Unrecoverable => {
                tracing::warn!(
                    subject = %key.subject,
                    subtopic = %key.subtopic,
                    "model reply could not be recovered into a JSON array, returning empty list"
                );
                Ok(Arc::new(Vec::new()))
            }
        }
    }

    /// Free-text generation for the PDF path. Never cached.
    pub async fn generate_document_text(
        &self,
        subject: &str,
        level: &str,
        num_questions: i64,
    ) -> Result<String> {
        let prompt = build_document_prompt(subject, level, num_questions);
        let text = self.provider.generate_text(&prompt).await?;
        if text.is_empty() {
            Ok("No response from model.".to_string())
        } else {
            Ok(text)
        }
    }
}

fn build_question_prompt(key: &PaperKey) -> String {
    format!(
        "Generate exactly {num} questions for the subject '{subject}', \
         focused on the subtopic '{subtopic}', at {level} difficulty level. \
         Questions should be a mix of conceptual and practical ones. \
         Return a valid JSON array where each item has keys: 'q_no' and 'question'. \
         If the question is multiple-choice, include an 'options' array labeled A, B, C, D. \
         Do NOT include answers or explanations. Only return pure JSON.",
        num = key.num_questions,
        subject = key.subject,
        subtopic = key.subtopic,
        level = key.level,
    )
}

fn build_document_prompt(subject: &str, level: &str, num_questions: i64) -> String {
    format!(
        "Create a {level} level question paper in {subject} with {num_questions} questions. \
         Each question should be numbered and relevant to {subject}."
    )
}

/// Two-stage parse of a model reply.
///
/// Stage one parses the whole reply as a JSON array. Stage two slices from
/// the first `[` through the last `]` and retries, which recovers arrays
/// wrapped in prose or code fences. An empty reply counts as an empty array.
pub fn parse_question_reply(raw: &str) -> ParseOutcome {
    if raw.trim().is_empty() {
        return ParseOutcome::Parsed(Vec::new());
    }

    if let Ok(items) = serde_json::from_str::<Vec<QuestionItem>>(raw) {
        return ParseOutcome::Parsed(items);
    }

    let (Some(start), Some(end)) = (raw.find('['), raw.rfind(']')) else {
        return ParseOutcome::Unrecoverable;
    };
    if start >= end {
        return ParseOutcome::Unrecoverable;
    }
    match serde_json::from_str::<Vec<QuestionItem>>(&raw[start..=end]) {
        Ok(items) => ParseOutcome::Parsed(items),
        Err(_) => ParseOutcome::Unrecoverable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Test double that always returns the same reply and counts calls.
    struct ScriptedGenerator {
        reply: std::result::Result<String, String>,
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl ScriptedGenerator {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
                delay: None,
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                calls: AtomicUsize::new(0),
                delay: None,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate_text(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(message) => Err(Error::Upstream(message.clone())),
            }
        }
    }

    fn key(subject: &str) -> PaperKey {
        PaperKey {
            subject: subject.to_string(),
            subtopic: "Lists".to_string(),
            level: "Medium".to_string(),
            num_questions: 5,
        }
    }

    #[test]
    fn parses_a_pure_json_array() {
        let outcome = parse_question_reply(r#"[{"q_no":1,"question":"What is a list?"}]"#);
        let ParseOutcome::Parsed(items) = outcome else {
            panic!("expected parsed outcome");
        };
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].q_no, 1);
        assert_eq!(items[0].question, "What is a list?");
        assert!(items[0].options.is_none());
    }

    #[test]
    fn recovers_an_array_wrapped_in_prose() {
        let outcome = parse_question_reply(r#"Here you go: [{"q_no":1,"question":"x"}] thanks"#);
        let ParseOutcome::Parsed(items) = outcome else {
            panic!("expected parsed outcome");
        };
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].question, "x");
    }

    #[test]
    fn noise_without_brackets_is_unrecoverable() {
        assert_eq!(
            parse_question_reply("the model had a bad day"),
            ParseOutcome::Unrecoverable
        );
    }

    #[test]
    fn noise_with_a_broken_bracket_pair_is_unrecoverable() {
        assert_eq!(
            parse_question_reply("] oops ["),
            ParseOutcome::Unrecoverable
        );
    }

    #[test]
    fn empty_reply_is_an_empty_array() {
        assert_eq!(parse_question_reply(""), ParseOutcome::Parsed(Vec::new()));
    }

    #[test]
    fn question_prompt_carries_the_request_fields() {
        let prompt = build_question_prompt(&key("Python"));
        assert!(prompt.contains("exactly 5 questions"));
        assert!(prompt.contains("'Python'"));
        assert!(prompt.contains("'Lists'"));
        assert!(prompt.contains("Medium difficulty"));
    }

    #[tokio::test]
    async fn identical_requests_are_served_from_the_cache() {
        let provider = Arc::new(ScriptedGenerator::ok(
            r#"[{"q_no":1,"question":"What is a list?"}]"#,
        ));
        let service = PaperService::new(provider.clone(), 128);

        let first = service.generate_questions(&key("Python")).await.unwrap();
        let second = service.generate_questions(&key("Python")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn concurrent_identical_requests_share_one_provider_call() {
        let provider = Arc::new(
            ScriptedGenerator::ok(r#"[{"q_no":1,"question":"x"}]"#)
                .with_delay(Duration::from_millis(20)),
        );
        let service = Arc::new(PaperService::new(provider.clone(), 128));

        let python = key("Python");
        let (a, b) = tokio::join!(
            service.generate_questions(&python),
            service.generate_questions(&python),
        );

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn evicted_keys_hit_the_provider_again() {
        let provider = Arc::new(ScriptedGenerator::ok("[]"));
        let service = PaperService::new(provider.clone(), 2);

        service.generate_questions(&key("Python")).await.unwrap();
        service.generate_questions(&key("Rust")).await.unwrap();
        service.generate_questions(&key("Go")).await.unwrap();
        // "Python" was evicted, so this is a fourth provider call.
        service.generate_questions(&key("Python")).await.unwrap();

        assert_eq!(provider.calls(), 4);
    }

    #[tokio::test]
    async fn unrecoverable_replies_are_not_cached() {
        let provider = Arc::new(ScriptedGenerator::ok("no json here"));
        let service = PaperService::new(provider.clone(), 128);

        let first = service.generate_questions(&key("Python")).await.unwrap();
        assert!(first.is_empty());
        let second = service.generate_questions(&key("Python")).await.unwrap();
        assert!(second.is_empty());

        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn provider_errors_propagate() {
        let provider = Arc::new(ScriptedGenerator::failing("quota exhausted"));
        let service = PaperService::new(provider.clone(), 128);

        let result = service.generate_questions(&key("Python")).await;
        assert!(matches!(result, Err(Error::Upstream(_))));
    }

    #[tokio::test]
    async fn empty_document_reply_gets_the_placeholder() {
        let provider = Arc::new(ScriptedGenerator::ok(""));
        let service = PaperService::new(provider, 128);

        let text = service
            .generate_document_text("Physics", "Hard", 10)
            .await
            .unwrap();
        assert_eq!(text, "No response from model.");
    }
}
