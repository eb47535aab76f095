//! Conversation state owned by the orchestrator.
//!
//! Everything here is plain data. The reducer folds events over a
//! [`ConversationModel`]; the runtime publishes [`ConversationSnapshot`]s
//! to whatever front-end is attached. No type in this module performs I/O.

use serde::{Deserialize, Serialize};

use crate::orchestrator::echo::SpokenTextMemo;

/// Placeholder bubble text shown while a reply is pending.
pub const PLACEHOLDER_TEXT: &str = "…";

/// Monotonic identifier for one conversation turn.
///
/// Every gateway call and every speak request is tagged with the turn that
/// started it, so completions arriving after the turn was superseded or
/// cancelled can be recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TurnId(pub(crate) u64);

impl std::fmt::Display for TurnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub(crate) u64);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who authored a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One entry in the conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub sender: Role,
    pub text: String,
    /// True while this message is the pending-reply bubble. Placeholders are
    /// never part of the transcript history; they live inside
    /// [`PendingReply`] and appear only in snapshots.
    pub is_placeholder: bool,
}

/// The single in-flight turn: a gateway request that has not yet finished
/// speaking (or finalizing) its reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReply {
    pub turn: TurnId,
    pub placeholder: Message,
}

/// How the user is currently interacting with the assistant.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    /// Spoken input and spoken replies.
    #[default]
    Voice,
    /// Typed input, replies shown but not spoken.
    Text,
    /// Both input paths live, replies spoken.
    Hybrid,
    /// Settings screen is open; no listening or speaking.
    SettingsView,
}

impl InteractionMode {
    /// Whether replies should be spoken aloud in this mode.
    pub fn speaks_replies(self) -> bool {
        matches!(self, Self::Voice | Self::Hybrid)
    }
}

/// Runtime behavior toggles, mirrored from the settings store.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BehaviorFlags {
    /// Whether the user may interrupt the assistant mid-sentence.
    pub barge_in_enabled: bool,
    /// Replies are shown but never spoken.
    pub muted: bool,
}

/// Coarse user-facing status line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum StatusIndicator {
    /// Nothing in flight.
    #[default]
    Ready,
    /// Recognizer running, waiting for speech.
    Listening,
    /// Interim hypothesis while the user is still talking.
    Hearing(String),
    /// Waiting on the reasoning gateway.
    Thinking,
    /// Reply is being spoken.
    Speaking,
    /// Microphone permission is missing; listening is blocked until regranted.
    MicPermissionNeeded,
    /// Speech input capability failed.
    InputFailed(String),
    /// Gateway produced no usable reply for the last turn.
    ReplyFailed,
    /// Speech output failed mid-reply.
    SpeechFailed,
}

/// Coarse conversation phase, used for logging and snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Listening,
    Thinking,
    Speaking,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::Thinking => "thinking",
            Self::Speaking => "speaking",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the conversation currently stands.
///
/// The pending reply and the spoken-text memo are payloads of the states
/// they belong to, so a pending reply outside Thinking/Speaking or a memo
/// outside Speaking cannot be represented at all.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationState {
    /// No capability active.
    Idle,
    /// Speech input running, no turn in flight.
    Listening,
    /// A turn is waiting on the reasoning gateway.
    Thinking { pending: PendingReply },
    /// The reply for `pending` is being spoken; `spoken` remembers its text
    /// for echo classification and final transcript insertion.
    Speaking {
        pending: PendingReply,
        spoken: SpokenTextMemo,
    },
}

impl ConversationState {
    pub fn phase(&self) -> Phase {
        match self {
            Self::Idle => Phase::Idle,
            Self::Listening => Phase::Listening,
            Self::Thinking { .. } => Phase::Thinking,
            Self::Speaking { .. } => Phase::Speaking,
        }
    }

    /// The in-flight turn, if any.
    pub fn pending(&self) -> Option<&PendingReply> {
        match self {
            Self::Idle | Self::Listening => None,
            Self::Thinking { pending } | Self::Speaking { pending, .. } => Some(pending),
        }
    }
}

/// Complete mutable state of one conversation session.
///
/// Owned exclusively by the orchestrator runtime; everyone else sees
/// [`ConversationSnapshot`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationModel {
    pub(super) state: ConversationState,
    pub(super) mode: InteractionMode,
    pub(super) flags: BehaviorFlags,
    pub(super) status: StatusIndicator,
    /// Finalized transcript, oldest first. Never contains placeholders.
    pub(super) messages: Vec<Message>,
    /// Sticky microphone-permission failure. Blocks listening until a
    /// permission-granted event clears it.
    pub(super) permission_denied: bool,
    next_message_id: u64,
    next_turn_id: u64,
}

impl ConversationModel {
    pub fn new(mode: InteractionMode, flags: BehaviorFlags) -> Self {
        Self {
            state: ConversationState::Idle,
            mode,
            flags,
            status: StatusIndicator::Ready,
            messages: Vec::new(),
            permission_denied: false,
            next_message_id: 1,
            next_turn_id: 1,
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn flags(&self) -> BehaviorFlags {
        self.flags
    }

    pub fn status(&self) -> &StatusIndicator {
        &self.status
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Append a finalized message to the transcript.
    pub(super) fn append(&mut self, sender: Role, text: impl Into<String>) -> MessageId {
        let id = self.mint_message_id();
        self.messages.push(Message {
            id,
            sender,
            text: text.into(),
            is_placeholder: false,
        });
        id
    }

    /// Mint the placeholder bubble for a new turn.
    pub(super) fn mint_placeholder(&mut self) -> Message {
        Message {
            id: self.mint_message_id(),
            sender: Role::Assistant,
            text: PLACEHOLDER_TEXT.to_owned(),
            is_placeholder: true,
        }
    }

    pub(super) fn mint_turn(&mut self) -> TurnId {
        let id = TurnId(self.next_turn_id);
        self.next_turn_id += 1;
        id
    }

    fn mint_message_id(&mut self) -> MessageId {
        let id = MessageId(self.next_message_id);
        self.next_message_id += 1;
        id
    }

    /// Immutable view for front-ends: transcript plus the pending-reply
    /// bubble (when a turn is in flight) and the coarse status.
    pub fn snapshot(&self) -> ConversationSnapshot {
        let mut messages = self.messages.clone();
        if let Some(pending) = self.state.pending() {
            messages.push(pending.placeholder.clone());
        }
        ConversationSnapshot {
            phase: self.phase(),
            status: self.status.clone(),
            mode: self.mode,
            flags: self.flags,
            messages,
        }
    }
}

/// Point-in-time view of the conversation for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationSnapshot {
    pub phase: Phase,
    pub status: StatusIndicator,
    pub mode: InteractionMode,
    pub flags: BehaviorFlags,
    /// Transcript with the pending placeholder (if any) appended at the end.
    pub messages: Vec<Message>,
}

impl Default for ConversationSnapshot {
    fn default() -> Self {
        ConversationModel::new(InteractionMode::default(), BehaviorFlags::default()).snapshot()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn message_ids_are_monotonic() {
        let mut model = ConversationModel::new(InteractionMode::Voice, BehaviorFlags::default());
        let a = model.append(Role::User, "one");
        let b = model.append(Role::Assistant, "two");
        let placeholder = model.mint_placeholder();
        assert!(a < b);
        assert!(b < placeholder.id);
    }

    #[test]
    fn turn_ids_are_monotonic() {
        let mut model = ConversationModel::new(InteractionMode::Voice, BehaviorFlags::default());
        let first = model.mint_turn();
        let second = model.mint_turn();
        assert!(first < second);
    }

    #[test]
    fn snapshot_appends_placeholder_bubble() {
        let mut model = ConversationModel::new(InteractionMode::Voice, BehaviorFlags::default());
        model.append(Role::User, "kas tu esi?");
        let placeholder = model.mint_placeholder();
        let turn = model.mint_turn();
        model.state = ConversationState::Thinking {
            pending: PendingReply { turn, placeholder },
        };

        let snapshot = model.snapshot();
        assert_eq!(snapshot.messages.len(), 2);
        let bubble = snapshot.messages.last().unwrap();
        assert!(bubble.is_placeholder);
        assert_eq!(bubble.text, PLACEHOLDER_TEXT);
        // The transcript itself holds only the finalized message.
        assert_eq!(model.messages().len(), 1);
    }

    #[test]
    fn pending_is_none_outside_thinking_and_speaking() {
        let model = ConversationModel::new(InteractionMode::Voice, BehaviorFlags::default());
        assert!(model.state().pending().is_none());
        assert_eq!(model.phase(), Phase::Idle);
    }

    #[test]
    fn settings_view_never_speaks() {
        assert!(InteractionMode::Voice.speaks_replies());
        assert!(InteractionMode::Hybrid.speaks_replies());
        assert!(!InteractionMode::Text.speaks_replies());
        assert!(!InteractionMode::SettingsView.speaks_replies());
    }
}
