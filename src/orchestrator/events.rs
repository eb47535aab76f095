//! Events folded through the reducer and the effects it requests back.
//!
//! Every external signal, whatever thread or callback it originates on, is
//! converted into an [`Event`] and queued. The runtime is the only consumer
//! of that queue and the only executor of [`Effect`]s, which keeps all state
//! mutation on a single task.

use crate::orchestrator::state::{BehaviorFlags, InteractionMode, TurnId};
use crate::voice::InputFault;

/// An external signal for the conversation state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// User asked to start listening, or the runtime is auto-resuming
    /// after a finished turn.
    ListenRequested,
    /// User asked to stop everything in flight.
    StopRequested,
    /// User switched interaction mode.
    ModeSelected(InteractionMode),
    /// User submitted typed text.
    TextSubmitted(String),
    /// Recognizer produced an interim hypothesis.
    PartialHypothesis(String),
    /// Recognizer finalized an utterance.
    FinalHypothesis(String),
    /// Speech input capability failed.
    InputError(InputFault),
    /// Platform reports the microphone permission is available again.
    PermissionGranted,
    /// The reasoning gateway resolved a reply for `turn`.
    ReplyReady { turn: TurnId, text: String },
    /// Speech output finished (or failed) the utterance for `turn`.
    SpeakFinished { turn: TurnId, success: bool },
    /// The settings store published new behavior flags.
    FlagsChanged(BehaviorFlags),
}

/// Side effects requested by a transition, executed by the runtime in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start continuous speech recognition.
    StartInput,
    /// Stop speech recognition. Safe when already stopped.
    StopInput,
    /// Stop any in-progress speech output. Safe when idle.
    StopOutput,
    /// Ask the reasoning gateway for a reply to `text`, tagged with `turn`.
    ConsultGateway { turn: TurnId, text: String },
    /// Abandon the in-flight gateway call for `turn`, if it is still running.
    CancelGateway { turn: TurnId },
    /// Speak `text` through the speech output, tagged with `turn`.
    Speak { turn: TurnId, text: String },
    /// Re-enter listening once the queue drains, as if the user had asked.
    Resume,
}
