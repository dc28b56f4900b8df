//! Refinement orchestration: one request/response cycle against a
//! conversational model, with the in-memory conversation owned here.

use crate::services::gemini::{
    reconcile_history, resolve_refinement_model, GeminiClient, GenerateOptions, GenerationError,
    InlineData, ResultImage, Turn,
};

/// The in-memory conversation of one refine session. Append-only, except
/// that loading a different history item replaces it wholesale; the session
/// orchestrator is the only mutator.
#[derive(Debug, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn replace(&mut self, turns: Vec<Turn>) {
        self.turns = turns;
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// Outcome of one refinement cycle. In every variant the conversation has
/// already been updated with the user turn and a model turn, so the rendered
/// sequence keeps alternating.
#[derive(Debug)]
pub enum RefineReply {
    Generated {
        images: Vec<ResultImage>,
        text: String,
    },
    /// The provider finished without output but reported a stop reason.
    Halted { reason: String, message: String },
    Failed {
        error: GenerationError,
        message: String,
    },
}

/// Drives the conversational refinement loop. Owns the conversation; one
/// request at a time (the caller awaits completion before resubmitting).
pub struct RefineSession {
    client: GeminiClient,
    conversation: Conversation,
}

impl RefineSession {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            conversation: Conversation::new(),
        }
    }

    /// Session seeded from a previously generated image (the create-flow
    /// hand-off): the conversation starts with a model turn carrying it.
    pub fn seeded(client: GeminiClient, image: ResultImage) -> Self {
        let mut session = Self::new(client);
        session.conversation.append(Turn::model_seed(image));
        session
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Replace the conversation with turns loaded from history.
    pub fn load(&mut self, turns: Vec<Turn>) {
        self.conversation.replace(turns);
    }

    /// One refinement cycle: reconcile history, call the model, fold the
    /// result back into the conversation.
    pub async fn refine(
        &mut self,
        message: &str,
        attachments: &[InlineData],
        use_economy: bool,
    ) -> RefineReply {
        let model = resolve_refinement_model(use_economy);
        let contents =
            reconcile_history(self.conversation.turns(), message, attachments, model);

        self.conversation.append(Turn::user(message));

        let result = self
            .client
            .generate_content(model, contents, &GenerateOptions::default())
            .await;

        let response = match result {
            Ok(response) => response,
            Err(error) => {
                let message = error.user_message();
                log::warn!("Refinement failed: {}", error);
                self.conversation.append(Turn::model_failure(message.as_str()));
                return RefineReply::Failed { error, message };
            }
        };

        if response.is_halted() {
            let reason = response.finish_reason.clone().unwrap_or_default();
            let message = GenerationError::stopped(reason.as_str()).user_message();
            self.conversation.append(Turn::model_failure(message.as_str()));
            return RefineReply::Halted { reason, message };
        }

        let images = response.result_images(message, model);
        let text = response.text.clone();
        self.conversation.append(Turn::model_reply(
            Some(text.clone()),
            images.clone(),
            response.parts,
        ));

        RefineReply::Generated { images, text }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::config::StudioConfig;
    use crate::services::gemini::Speaker;

    fn stored_image(label: &str) -> ResultImage {
        ResultImage {
            id: "img_seed".to_string(),
            mime_type: "image/png".to_string(),
            data: "QUJD".to_string(),
            prompt: "a lighthouse".to_string(),
            model: label.to_string(),
            provider_parts: None,
            created_at_ms: 1,
        }
    }

    #[test]
    fn test_seeded_session_starts_with_model_turn() {
        let session = RefineSession::seeded(
            GeminiClient::new(StudioConfig::default()),
            stored_image("Gemini 3 Pro"),
        );

        let turns = session.conversation().turns();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, Speaker::Model);
        assert_eq!(turns[0].images.len(), 1);
    }

    #[test]
    fn test_load_replaces_conversation() {
        let mut session = RefineSession::seeded(
            GeminiClient::new(StudioConfig::default()),
            stored_image("Gemini 3 Pro"),
        );

        session.load(vec![Turn::user("hello"), Turn::model_failure("failed")]);
        let turns = session.conversation().turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Speaker::User);
    }

    #[tokio::test]
    async fn test_failure_still_appends_model_turn() {
        // No API key: the call fails before the wire, and the conversation
        // still gains user + model turns so alternation holds.
        let mut session = RefineSession::new(GeminiClient::new(StudioConfig::default()));

        let reply = session.refine("make it brighter", &[], false).await;

        assert!(matches!(reply, RefineReply::Failed { .. }));
        let turns = session.conversation().turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Speaker::User);
        assert_eq!(turns[1].role, Speaker::Model);
        let failure_text = turns[1].text.as_deref().unwrap();
        assert!(failure_text.contains("missing API key"));
    }
}
