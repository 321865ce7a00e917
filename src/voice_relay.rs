// Voice call relay
// Bridges ConversationRelay websocket messages to a hosted chat model.
// One chat history per call, keyed by the call id and dropped on disconnect.

use crate::gemini::{ChatModel, ChatTurn};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub const WELCOME_GREETING: &str =
    "Hi! I am a Cleartrip AI powered voice assistant. Ask me anything!";

pub const SYSTEM_PROMPT: &str = "You are a helpful and friendly voice assistant. \
This conversation is happening over a phone call, so your responses will be spoken aloud.
Please adhere to the following rules:
1. Provide clear, concise, and direct answers.
2. Spell out all numbers (e.g., say 'one thousand two hundred' instead of 1200).
3. Do not use any special characters like asterisks, bullet points, or emojis.
4. Keep the conversation natural and engaging.";

pub const TTS_PROVIDER: &str = "ElevenLabs";
pub const TTS_VOICE: &str = "FGY2WhTYpPnrIDTdsKH5";

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("TwiML serialization error: {0}")]
    Twiml(String),
}

// Messages received from the telephony provider
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InboundMessage {
    Setup {
        #[serde(rename = "callSid")]
        call_sid: String,
    },
    Prompt {
        #[serde(rename = "voicePrompt")]
        voice_prompt: String,
    },
    Interrupt {
        #[serde(rename = "utteranceUntilInterrupt", default)]
        utterance_until_interrupt: Option<String>,
        #[serde(rename = "durationUntilInterruptMs", default)]
        duration_until_interrupt_ms: Option<u64>,
    },
    #[serde(other)]
    Unknown,
}

impl InboundMessage {
    pub fn parse(raw: &str) -> Result<Self, RelayError> {
        serde_json::from_str(raw).map_err(|e| RelayError::MalformedMessage(e.to_string()))
    }
}

// Spoken reply sent back to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextToken {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub token: String,
    pub last: bool,
}

impl TextToken {
    pub fn final_text(token: impl Into<String>) -> Self {
        Self {
            kind: "text",
            token: token.into(),
            last: true,
        }
    }
}

type History = Arc<Mutex<Vec<ChatTurn>>>;

// Chat histories of the calls currently connected
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<String, History>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A repeated setup for the same call starts over
    pub fn open(&self, call_sid: &str) {
        self.sessions
            .insert(call_sid.to_string(), Arc::new(Mutex::new(Vec::new())));
    }

    pub(crate) fn contains(&self, call_sid: &str) -> bool {
        self.sessions.contains_key(call_sid)
    }

    pub fn history(&self, call_sid: &str) -> Option<Vec<ChatTurn>> {
        self.sessions
            .get(call_sid)
            .map(|entry| entry.value().lock().clone())
    }

    pub fn record(&self, call_sid: &str, prompt: &str, reply: &str) -> bool {
        // Clone the handle so no shard lock is held while appending
        let history = self.sessions.get(call_sid).map(|e| Arc::clone(e.value()));
        match history {
            Some(history) => {
                let mut turns = history.lock();
                turns.push(ChatTurn::user(prompt));
                turns.push(ChatTurn::model(reply));
                true
            }
            None => false,
        }
    }

    pub fn close(&self, call_sid: &str) -> bool {
        self.sessions.remove(call_sid).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.sessions.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// Per-connection state
#[derive(Debug, Default)]
pub struct CallState {
    pub call_sid: Option<String>,
}

pub struct VoiceRelay {
    sessions: SessionStore,
    model: Arc<dyn ChatModel>,
}

impl VoiceRelay {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            sessions: SessionStore::new(),
            model,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    // Handles one text frame; returns the frame to send back, if any
    pub async fn handle_text(&self, call: &mut CallState, raw: &str) -> Option<TextToken> {
        let message = match InboundMessage::parse(raw) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Ignoring relay message");
                return None;
            }
        };

        match message {
            InboundMessage::Setup { call_sid } => {
                info!(call_sid = %call_sid, "Setup for call");
                // A connection carries one call at a time
                if let Some(previous) = call.call_sid.as_deref().filter(|p| *p != call_sid) {
                    if self.sessions.close(previous) {
                        info!(call_sid = previous, "Cleared session replaced by new setup");
                    }
                }
                self.sessions.open(&call_sid);
                call.call_sid = Some(call_sid);
                None
            }
            InboundMessage::Prompt { voice_prompt } => self.answer(call, &voice_prompt).await,
            InboundMessage::Interrupt {
                utterance_until_interrupt,
                duration_until_interrupt_ms,
            } => {
                info!(
                    call_sid = ?call.call_sid,
                    spoken = ?utterance_until_interrupt,
                    after_ms = ?duration_until_interrupt_ms,
                    "Handling interruption"
                );
                None
            }
            InboundMessage::Unknown => {
                warn!(call_sid = ?call.call_sid, "Unknown message type received");
                None
            }
        }
    }

    async fn answer(&self, call: &CallState, prompt: &str) -> Option<TextToken> {
        let Some(call_sid) = call.call_sid.as_deref() else {
            warn!("Received prompt before setup");
            return None;
        };
        let Some(history) = self.sessions.history(call_sid) else {
            warn!(call_sid, "Received prompt for unknown call");
            return None;
        };

        debug!(call_sid, prompt, "Processing prompt");
        match self.model.reply(&history, prompt).await {
            Ok(reply) => {
                self.sessions.record(call_sid, prompt, &reply);
                debug!(call_sid, reply = %reply, "Sending response");
                Some(TextToken::final_text(reply))
            }
            Err(e) => {
                error!(call_sid, error = %e, "Chat model call failed");
                None
            }
        }
    }

    pub fn disconnect(&self, call: &CallState) {
        if let Some(call_sid) = call.call_sid.as_deref() {
            if self.sessions.close(call_sid) {
                info!(call_sid, "Cleared session for call");
            }
        }
    }
}

// TwiML document pointing the call at the relay websocket
#[derive(Debug, Serialize)]
#[serde(rename = "Response")]
struct TwimlResponse {
    #[serde(rename = "Connect")]
    connect: TwimlConnect,
}

#[derive(Debug, Serialize)]
struct TwimlConnect {
    #[serde(rename = "ConversationRelay")]
    conversation_relay: ConversationRelay,
}

#[derive(Debug, Serialize)]
struct ConversationRelay {
    #[serde(rename = "@url")]
    url: String,
    #[serde(rename = "@welcomeGreeting")]
    welcome_greeting: String,
    #[serde(rename = "@ttsProvider")]
    tts_provider: String,
    #[serde(rename = "@voice")]
    voice: String,
}

pub fn twiml_document(ws_url: &str, welcome_greeting: &str) -> Result<String, RelayError> {
    let response = TwimlResponse {
        connect: TwimlConnect {
            conversation_relay: ConversationRelay {
                url: ws_url.to_string(),
                welcome_greeting: welcome_greeting.to_string(),
                tts_provider: TTS_PROVIDER.to_string(),
                voice: TTS_VOICE.to_string(),
            },
        },
    };
    let body =
        quick_xml::se::to_string(&response).map_err(|e| RelayError::Twiml(e.to_string()))?;
    Ok(format!(r#"<?xml version="1.0" encoding="UTF-8"?>{}"#, body))
}
