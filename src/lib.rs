//! Elza: A voice-first conversational assistant runtime.
//!
//! This crate provides the turn-taking core of a voice assistant:
//! transcripts in, replies out, with speech capture and synthesis
//! behind pluggable traits.
//!
//! # Architecture
//!
//! Two halves, connected by a single event queue:
//! - **Orchestrator**: A pure state machine over the conversation
//!   (idle/listening/thinking/speaking) driven by an async runtime
//!   loop. Handles turn-taking, barge-in, and echo suppression.
//! - **Reasoning gateway**: Turns a user utterance into reply text via
//!   a pluggable [`ReasoningPort`], with offline and failure fallbacks
//!   so a turn always ends in a usable sentence.
//!
//! Speech capture ([`voice::SpeechInput`]) and synthesis
//! ([`voice::SpeechOutput`]) are trait objects; the crate ships no-op
//! implementations for text-only deployments and tests.

pub mod config;
pub mod error;
pub mod gateway;
pub mod orchestrator;
pub mod settings;
pub mod voice;

pub use config::ElzaConfig;
pub use error::{ElzaError, Result};
pub use gateway::{AlwaysOnline, ConnectivityProbe, ReasoningGateway, ReasoningPort, Reply};
pub use orchestrator::{
    ConversationSnapshot, InteractionMode, Orchestrator, OrchestratorHandle,
};
pub use settings::{SettingsSnapshot, SettingsStore};
