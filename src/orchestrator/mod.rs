//! Conversation orchestrator: turn-taking between the user and the assistant.
//!
//! The orchestrator decides when the assistant listens, thinks and speaks.
//! It is split the classic way:
//! - [`state`]: plain data (model, transcript, snapshots)
//! - [`reducer`]: the pure state machine, `(model, event) -> (model, effects)`
//! - [`runtime`]: the single task that owns the model, queues events and
//!   executes effects against the speech capabilities and the gateway
//! - [`echo`]: classification of recognizer finals heard mid-reply

pub mod echo;
pub mod events;
pub mod reducer;
pub mod runtime;
pub mod state;

pub use echo::SpokenTextMemo;
pub use events::{Effect, Event};
pub use reducer::{Step, transition};
pub use runtime::{Orchestrator, OrchestratorHandle};
pub use state::{
    BehaviorFlags, ConversationModel, ConversationSnapshot, ConversationState, InteractionMode,
    Message, MessageId, PendingReply, Phase, Role, StatusIndicator, TurnId,
};
