//! crates/dream_journal_core/src/interpreter.rs
//!
//! The interpretation request flow: given a dream, generate its three-perspective
//! analysis through the `CompletionService` port, persist it through the
//! `DreamStore` port, and mark the dream as interpreted.

use std::sync::Arc;

use crate::domain::{Dream, Interpretation, PerspectiveText};
use crate::ports::{CompletionService, DreamStore, PortError};

/// Generation settings used for all three perspective prompts.
const INTERPRETATION_TEMPERATURE: f32 = 0.7;
const INTERPRETATION_MAX_TOKENS: u32 = 800;

/// The three fixed interpretive perspectives, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Perspective {
    Islamic,
    Spiritual,
    Scientific,
}

impl Perspective {
    /// Builds the prompt for this perspective, embedding the dream text verbatim.
    pub fn prompt(self, dream_content: &str) -> String {
        match self {
            Perspective::Islamic => format!(
                "As an expert in Islamic dream interpretation, analyze this dream considering \
                 Islamic traditions and teachings. Provide a clear title and detailed \
                 interpretation. Dream: {dream_content}"
            ),
            Perspective::Spiritual => format!(
                "As a spiritual guide, interpret this dream from a broader spiritual and \
                 metaphysical perspective. Consider universal symbols and provide a clear \
                 title and detailed interpretation. Dream: {dream_content}"
            ),
            Perspective::Scientific => format!(
                "As a psychology expert, analyze this dream from a scientific and \
                 psychological perspective. Consider modern dream research and provide a \
                 clear title and detailed interpretation. Dream: {dream_content}"
            ),
        }
    }
}

//=========================================================================================
// Error Type
//=========================================================================================

/// Failures of the interpretation flow, split by which collaborator failed.
#[derive(Debug, thiserror::Error)]
pub enum InterpretError {
    /// One of the completion calls failed; nothing was persisted.
    #[error("Completion service failed: {0}")]
    Upstream(PortError),
    /// The record store failed while persisting the interpretation or the
    /// dream flag.
    #[error("Storage failed: {0}")]
    Storage(PortError),
}

//=========================================================================================
// Response Parsing
//=========================================================================================

/// Splits a completion response into a (title, content) pair.
///
/// The completion service is asked for a title line followed by the analysis
/// body, so the first line (minus a literal "Title: " prefix, if present)
/// becomes the title and the remaining lines, trimmed, the content. This is
/// best-effort: a single-line response becomes a title with empty content,
/// and an empty response falls back to an empty title with the whole trimmed
/// text as content.
pub fn parse_titled_response(raw: &str) -> PerspectiveText {
    let trimmed = raw.trim();
    let mut lines = trimmed.lines();

    match lines.next() {
        Some(first) if !first.trim().is_empty() => {
            let first = first.trim();
            let title = first.strip_prefix("Title: ").unwrap_or(first).to_string();
            let content = lines.collect::<Vec<_>>().join("\n").trim().to_string();
            PerspectiveText { title, content }
        }
        _ => PerspectiveText {
            title: String::new(),
            content: trimmed.to_string(),
        },
    }
}

//=========================================================================================
// The Interpretation Requester
//=========================================================================================

/// Orchestrates the interpretation flow against its two collaborators.
#[derive(Clone)]
pub struct InterpretationRequester {
    store: Arc<dyn DreamStore>,
    completions: Arc<dyn CompletionService>,
}

impl InterpretationRequester {
    pub fn new(store: Arc<dyn DreamStore>, completions: Arc<dyn CompletionService>) -> Self {
        Self { store, completions }
    }

    /// Produces and persists the three-perspective interpretation for `dream`,
    /// then marks the dream interpreted.
    ///
    /// If an interpretation already exists it is returned unchanged and no
    /// completion calls are made. The three completion requests run
    /// concurrently; if any one fails the whole operation fails and nothing
    /// is persisted.
    pub async fn interpret_dream(&self, dream: &Dream) -> Result<Interpretation, InterpretError> {
        if let Some(existing) = self
            .store
            .find_interpretation(dream.id)
            .await
            .map_err(InterpretError::Storage)?
        {
            return Ok(existing);
        }

        let (islamic_raw, spiritual_raw, scientific_raw) = futures::try_join!(
            self.request_perspective(Perspective::Islamic, &dream.content),
            self.request_perspective(Perspective::Spiritual, &dream.content),
            self.request_perspective(Perspective::Scientific, &dream.content),
        )
        .map_err(InterpretError::Upstream)?;

        let interpretation = self
            .store
            .insert_interpretation(
                dream.id,
                parse_titled_response(&islamic_raw),
                parse_titled_response(&spiritual_raw),
                parse_titled_response(&scientific_raw),
            )
            .await
            .map_err(InterpretError::Storage)?;

        self.store
            .update_dream_flag(dream.id, true)
            .await
            .map_err(InterpretError::Storage)?;

        Ok(interpretation)
    }

    async fn request_perspective(
        &self,
        perspective: Perspective,
        dream_content: &str,
    ) -> Result<String, PortError> {
        self.completions
            .complete(
                &perspective.prompt(dream_content),
                INTERPRETATION_TEMPERATURE,
                INTERPRETATION_MAX_TOKENS,
            )
            .await
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::ports::{DreamStore, PortResult};

    fn sample_dream() -> Dream {
        Dream {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Flying over the city".to_string(),
            content: "I was soaring above rooftops and felt completely free.".to_string(),
            emotions: vec!["joy".to_string(), "awe".to_string()],
            created_at: Utc::now(),
            has_interpretation: false,
        }
    }

    /// A completion stub that records every prompt it receives and answers
    /// by perspective, optionally failing for prompts containing a marker.
    struct ScriptedCompletions {
        prompts: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl ScriptedCompletions {
        fn new() -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
                fail_on: None,
            }
        }

        fn failing_on(marker: &'static str) -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
                fail_on: Some(marker),
            }
        }

        fn recorded_prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionService for ScriptedCompletions {
        async fn complete(
            &self,
            prompt: &str,
            _temperature: f32,
            _max_tokens: u32,
        ) -> PortResult<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if let Some(marker) = self.fail_on {
                if prompt.contains(marker) {
                    return Err(PortError::Unexpected("completion backend unavailable".into()));
                }
            }
            if prompt.contains("Islamic") {
                Ok("Title: Mercy and Rain\nWater often signals provision and relief.".into())
            } else if prompt.contains("spiritual guide") {
                Ok("Title: Rising Spirit\nFlight points to a release of old burdens.".into())
            } else {
                Ok("Title: Threat Rehearsal\nDreams of flight map to mastery experiences.".into())
            }
        }
    }

    /// An in-memory store covering only the operations the requester touches.
    /// The insert emulates the storage-level uniqueness on dream id.
    struct InMemoryStore {
        interpretations: Mutex<HashMap<Uuid, Interpretation>>,
        flags: Mutex<HashMap<Uuid, bool>>,
        fail_insert: bool,
        fail_flag_update: bool,
    }

    impl InMemoryStore {
        fn new() -> Self {
            Self {
                interpretations: Mutex::new(HashMap::new()),
                flags: Mutex::new(HashMap::new()),
                fail_insert: false,
                fail_flag_update: false,
            }
        }

        fn failing_insert() -> Self {
            Self {
                fail_insert: true,
                ..Self::new()
            }
        }

        fn failing_flag_update() -> Self {
            Self {
                fail_flag_update: true,
                ..Self::new()
            }
        }

        fn seed(&self, interpretation: Interpretation) {
            self.interpretations
                .lock()
                .unwrap()
                .insert(interpretation.dream_id, interpretation);
        }

        fn stored_count(&self) -> usize {
            self.interpretations.lock().unwrap().len()
        }

        fn flag_for(&self, dream_id: Uuid) -> bool {
            self.flags
                .lock()
                .unwrap()
                .get(&dream_id)
                .copied()
                .unwrap_or(false)
        }
    }

    #[async_trait]
    impl DreamStore for InMemoryStore {
        async fn create_dream(
            &self,
            _user_id: Uuid,
            _title: &str,
            _content: &str,
            _emotions: &[String],
        ) -> PortResult<Dream> {
            Err(PortError::Unexpected("not exercised".into()))
        }

        async fn get_dream_by_id(&self, dream_id: Uuid) -> PortResult<Dream> {
            Err(PortError::NotFound(dream_id.to_string()))
        }

        async fn list_dreams_for_user(&self, _user_id: Uuid) -> PortResult<Vec<Dream>> {
            Err(PortError::Unexpected("not exercised".into()))
        }

        async fn find_interpretation(&self, dream_id: Uuid) -> PortResult<Option<Interpretation>> {
            Ok(self.interpretations.lock().unwrap().get(&dream_id).cloned())
        }

        async fn insert_interpretation(
            &self,
            dream_id: Uuid,
            islamic: PerspectiveText,
            spiritual: PerspectiveText,
            scientific: PerspectiveText,
        ) -> PortResult<Interpretation> {
            if self.fail_insert {
                return Err(PortError::Unexpected("insert rejected".into()));
            }
            let mut interpretations = self.interpretations.lock().unwrap();
            if let Some(existing) = interpretations.get(&dream_id) {
                return Ok(existing.clone());
            }
            let interpretation = Interpretation {
                id: Uuid::new_v4(),
                dream_id,
                islamic,
                spiritual,
                scientific,
                created_at: Utc::now(),
            };
            interpretations.insert(dream_id, interpretation.clone());
            Ok(interpretation)
        }

        async fn update_dream_flag(
            &self,
            dream_id: Uuid,
            has_interpretation: bool,
        ) -> PortResult<()> {
            if self.fail_flag_update {
                return Err(PortError::Unexpected("flag update rejected".into()));
            }
            self.flags.lock().unwrap().insert(dream_id, has_interpretation);
            Ok(())
        }
    }

    fn requester(
        store: Arc<InMemoryStore>,
        completions: Arc<ScriptedCompletions>,
    ) -> InterpretationRequester {
        InterpretationRequester::new(store, completions)
    }

    #[tokio::test]
    async fn returns_existing_interpretation_without_completion_calls() {
        let dream = sample_dream();
        let store = Arc::new(InMemoryStore::new());
        let existing = Interpretation {
            id: Uuid::new_v4(),
            dream_id: dream.id,
            islamic: PerspectiveText {
                title: "Old title".into(),
                content: "Old content".into(),
            },
            spiritual: PerspectiveText {
                title: "s".into(),
                content: "s".into(),
            },
            scientific: PerspectiveText {
                title: "c".into(),
                content: "c".into(),
            },
            created_at: Utc::now(),
        };
        store.seed(existing.clone());
        let completions = Arc::new(ScriptedCompletions::new());

        let result = requester(store.clone(), completions.clone())
            .interpret_dream(&dream)
            .await
            .expect("should return the cached interpretation");

        assert_eq!(result.id, existing.id);
        assert_eq!(result.islamic.title, "Old title");
        assert!(completions.recorded_prompts().is_empty());
        assert_eq!(store.stored_count(), 1);
    }

    #[tokio::test]
    async fn issues_three_prompts_each_embedding_the_dream_content() {
        let dream = sample_dream();
        let store = Arc::new(InMemoryStore::new());
        let completions = Arc::new(ScriptedCompletions::new());

        requester(store, completions.clone())
            .interpret_dream(&dream)
            .await
            .expect("interpretation should succeed");

        let prompts = completions.recorded_prompts();
        assert_eq!(prompts.len(), 3);
        for prompt in &prompts {
            assert!(
                prompt.contains(&dream.content),
                "prompt should embed the dream text verbatim: {prompt}"
            );
        }
    }

    #[tokio::test]
    async fn stores_parsed_pairs_and_sets_the_flag() {
        let dream = sample_dream();
        let store = Arc::new(InMemoryStore::new());
        let completions = Arc::new(ScriptedCompletions::new());

        let interpretation = requester(store.clone(), completions)
            .interpret_dream(&dream)
            .await
            .expect("interpretation should succeed");

        assert_eq!(interpretation.dream_id, dream.id);
        assert_eq!(interpretation.islamic.title, "Mercy and Rain");
        assert_eq!(
            interpretation.islamic.content,
            "Water often signals provision and relief."
        );
        assert_eq!(interpretation.spiritual.title, "Rising Spirit");
        assert_eq!(interpretation.scientific.title, "Threat Rehearsal");
        assert!(store.flag_for(dream.id));
    }

    #[tokio::test]
    async fn single_completion_failure_persists_nothing() {
        let dream = sample_dream();
        let store = Arc::new(InMemoryStore::new());
        // Fail only the spiritual perspective; the other two succeed.
        let completions = Arc::new(ScriptedCompletions::failing_on("spiritual guide"));

        let result = requester(store.clone(), completions)
            .interpret_dream(&dream)
            .await;

        assert!(matches!(result, Err(InterpretError::Upstream(_))));
        assert_eq!(store.stored_count(), 0);
        assert!(!store.flag_for(dream.id));
    }

    #[tokio::test]
    async fn insert_failure_surfaces_as_storage_error_and_leaves_flag_false() {
        let dream = sample_dream();
        let store = Arc::new(InMemoryStore::failing_insert());
        let completions = Arc::new(ScriptedCompletions::new());

        let result = requester(store.clone(), completions)
            .interpret_dream(&dream)
            .await;

        assert!(matches!(result, Err(InterpretError::Storage(_))));
        assert!(!store.flag_for(dream.id));
    }

    #[tokio::test]
    async fn flag_update_failure_surfaces_as_storage_error_after_durable_insert() {
        let dream = sample_dream();
        let store = Arc::new(InMemoryStore::failing_flag_update());
        let completions = Arc::new(ScriptedCompletions::new());

        let result = requester(store.clone(), completions)
            .interpret_dream(&dream)
            .await;

        // The insert already went through; only the flag write failed.
        assert!(matches!(result, Err(InterpretError::Storage(_))));
        assert_eq!(store.stored_count(), 1);
        assert!(!store.flag_for(dream.id));
    }

    #[tokio::test]
    async fn retry_after_flag_update_failure_returns_stored_record() {
        let dream = sample_dream();
        let store = Arc::new(InMemoryStore::failing_flag_update());
        let completions = Arc::new(ScriptedCompletions::new());
        let requester = requester(store.clone(), completions.clone());

        requester
            .interpret_dream(&dream)
            .await
            .expect_err("flag update should fail");

        // The retry finds the durable row and short-circuits before any
        // completion call or flag write.
        let retried = requester
            .interpret_dream(&dream)
            .await
            .expect("retry should return the stored interpretation");

        assert_eq!(retried.dream_id, dream.id);
        assert_eq!(store.stored_count(), 1);
        assert_eq!(completions.recorded_prompts().len(), 3);
    }

    #[tokio::test]
    async fn concurrent_requests_for_one_dream_store_a_single_record() {
        let dream = sample_dream();
        let store = Arc::new(InMemoryStore::new());
        let completions = Arc::new(ScriptedCompletions::new());
        let requester = requester(store.clone(), completions);

        let (a, b) = tokio::join!(
            requester.interpret_dream(&dream),
            requester.interpret_dream(&dream)
        );

        let a = a.expect("first call should succeed");
        let b = b.expect("second call should succeed");
        assert_eq!(store.stored_count(), 1);
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn parses_title_prefix_and_body() {
        let parsed = parse_titled_response("Title: Flight of Freedom\nThe dream reflects...");
        assert_eq!(parsed.title, "Flight of Freedom");
        assert_eq!(parsed.content, "The dream reflects...");
    }

    #[test]
    fn parses_first_line_without_prefix_as_title() {
        let parsed = parse_titled_response("Flight of Freedom\nLine one.\nLine two.");
        assert_eq!(parsed.title, "Flight of Freedom");
        assert_eq!(parsed.content, "Line one.\nLine two.");
    }

    #[test]
    fn single_line_response_becomes_title_with_empty_content() {
        let parsed = parse_titled_response("A strange omen");
        assert_eq!(parsed.title, "A strange omen");
        assert_eq!(parsed.content, "");
    }

    #[test]
    fn empty_response_falls_back_to_empty_pair() {
        let parsed = parse_titled_response("   \n  ");
        assert_eq!(parsed.title, "");
        assert_eq!(parsed.content, "");
    }
}
