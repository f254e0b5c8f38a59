//! Pet chat: a short-form conversation with the slime character.
//!
//! The persona is derived from the live avatar color and level. Chat is
//! decorative: when the LLM backend is down the pet answers with a canned
//! line instead of surfacing an error.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::infrastructure::ports::{
    ChatMessage, LlmPort, LlmRequest, RandomPort,
};
use crate::stores::GameStore;

/// Replies used when the chat backend is unreachable.
const FALLBACK_REPLIES: [&str; 5] = [
    "Squish squish~ I can't talk right now!",
    "So soft... and a little sleepy...",
    "Hmm... my words aren't working today!",
    "I can't chat right now, but I'll be back soon!",
    "Squish! Talk to me again later, okay?",
];

const REPLY_MAX_TOKENS: u32 = 150;
const REPLY_TEMPERATURE: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    Player,
    Pet,
}

/// One prior exchange, as kept by the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

pub struct ChatWithPet {
    llm: Arc<dyn LlmPort>,
    store: Arc<GameStore>,
    random: Arc<dyn RandomPort>,
}

impl ChatWithPet {
    pub fn new(llm: Arc<dyn LlmPort>, store: Arc<GameStore>, random: Arc<dyn RandomPort>) -> Self {
        Self { llm, store, random }
    }

    pub async fn execute(&self, message: String, history: Vec<ChatTurn>) -> String {
        let avatar = self.store.avatar().await;
        let progression = self.store.progression().await;

        let mut messages: Vec<ChatMessage> = history
            .into_iter()
            .map(|turn| match turn.role {
                ChatRole::Player => ChatMessage::user(turn.content),
                ChatRole::Pet => ChatMessage::assistant(turn.content),
            })
            .collect();
        messages.push(ChatMessage::user(message));

        let request = LlmRequest::new(messages)
            .with_system_prompt(persona_prompt(&avatar.color.to_string(), progression.level))
            .with_temperature(REPLY_TEMPERATURE)
            .with_max_tokens(Some(REPLY_MAX_TOKENS));

        match self.llm.generate(request).await {
            Ok(response) => response.content,
            Err(e) => {
                tracing::warn!(error = %e, "Chat backend failed, using fallback reply");
                let index = self
                    .random
                    .gen_range(0, FALLBACK_REPLIES.len() as i32 - 1)
                    .clamp(0, FALLBACK_REPLIES.len() as i32 - 1) as usize;
                FALLBACK_REPLIES[index].to_string()
            }
        }
    }
}

fn persona_prompt(color: &str, level: u32) -> String {
    format!(
        "You are a cute level {level} slime pet with a {color} body. \
         You adore your player, use a simple affectionate voice, and answer \
         in at most two or three short sentences. You love being petted and \
         fed, get a little smarter each level, and sometimes yawn when \
         sleepy. Sprinkle in soft noises like 'squish' now and then."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedRandom;
    use crate::infrastructure::ports::{LlmError, LlmResponse, MockLlmPort};

    #[tokio::test]
    async fn test_reply_comes_from_backend() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate().returning(|request| {
            // The persona prompt reflects the avatar.
            let system = request.system_prompt.clone().unwrap_or_default();
            assert!(system.contains("blue"));
            assert!(system.contains("level 1"));
            Ok(LlmResponse {
                content: "Squish! Hi!".to_string(),
            })
        });

        let chat = ChatWithPet::new(
            Arc::new(llm),
            Arc::new(GameStore::new()),
            Arc::new(FixedRandom(0)),
        );
        let reply = chat.execute("hello".to_string(), Vec::new()).await;
        assert_eq!(reply, "Squish! Hi!");
    }

    #[tokio::test]
    async fn test_backend_failure_yields_fallback_line() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate()
            .returning(|_| Err(LlmError::RequestFailed("connection refused".to_string())));

        let chat = ChatWithPet::new(
            Arc::new(llm),
            Arc::new(GameStore::new()),
            Arc::new(FixedRandom(2)),
        );
        let reply = chat.execute("hello".to_string(), Vec::new()).await;
        assert_eq!(reply, FALLBACK_REPLIES[2]);
    }

    #[tokio::test]
    async fn test_history_is_passed_through() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate().returning(|request| {
            assert_eq!(request.messages.len(), 3);
            Ok(LlmResponse {
                content: "ok".to_string(),
            })
        });

        let chat = ChatWithPet::new(
            Arc::new(llm),
            Arc::new(GameStore::new()),
            Arc::new(FixedRandom(0)),
        );
        let history = vec![
            ChatTurn {
                role: ChatRole::Player,
                content: "hi".to_string(),
            },
            ChatTurn {
                role: ChatRole::Pet,
                content: "squish".to_string(),
            },
        ];
        chat.execute("how are you?".to_string(), history).await;
    }
}
