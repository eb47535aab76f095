//! Capability traits for speech input and output.
//!
//! Concrete engines (platform recognizers, neural synthesis, remote audio
//! stacks) live outside this crate. The orchestrator only ever talks to
//! these seams, which makes the whole state machine drivable from tests
//! with scripted fakes.
//!
//! Contract notes shared by both traits:
//! - `stop` must be idempotent. The runtime calls it unconditionally on any
//!   forced return to idle, including when nothing was started.
//! - Neither `start` nor `speak` may block for the duration of the activity;
//!   they kick the engine off and return, reporting through their channel.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::orchestrator::TurnId;

/// Faults a speech input capability can report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputFault {
    /// Microphone permission is missing or was revoked.
    PermissionDenied,
    /// Any other device or engine failure.
    Device(String),
}

impl std::fmt::Display for InputFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => f.write_str("microphone permission denied"),
            Self::Device(reason) => write!(f, "device failure: {reason}"),
        }
    }
}

/// One recognition event from the speech input capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HypothesisEvent {
    /// Interim hypothesis; display only, may be revised.
    Partial(String),
    /// Finalized hypothesis for one utterance.
    Final(String),
    /// Engine status line (session opened, endpoint detected, ...).
    /// Logged by the runtime, never fed to the state machine.
    Status(String),
    /// The engine gave up; no further events will arrive until restarted.
    Error(InputFault),
}

/// Sender half handed to the input capability on `start`.
pub type HypothesisSender = mpsc::UnboundedSender<HypothesisEvent>;

/// Completion notice for one `speak` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeakOutcome {
    /// Turn that requested the utterance.
    pub turn: TurnId,
    /// Whether synthesis and playback ran to completion.
    pub success: bool,
}

/// Sender half handed to the output capability on `speak`.
pub type OutcomeSender = mpsc::UnboundedSender<SpeakOutcome>;

/// Continuous speech recognition.
#[async_trait]
pub trait SpeechInput: Send + Sync {
    /// Begin continuous recognition, delivering events to `events` until
    /// `stop` is called or the engine fails.
    async fn start(&self, events: HypothesisSender) -> Result<()>;

    /// Stop recognition and release the microphone.
    async fn stop(&self);
}

/// Speech synthesis and playback.
#[async_trait]
pub trait SpeechOutput: Send + Sync {
    /// Speak `text`, reporting exactly one outcome for `turn` on `done`
    /// unless preempted by `stop`. Outcomes for preempted utterances may
    /// still arrive and are the caller's job to ignore.
    async fn speak(&self, turn: TurnId, text: &str, done: OutcomeSender) -> Result<()>;

    /// Cut off any in-progress utterance.
    async fn stop(&self);
}

/// Speech input that never hears anything.
///
/// For headless embeddings (text-only consoles, tests) where a microphone
/// does not exist but the orchestrator still wants to drive its listening
/// lifecycle.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSpeechInput;

#[async_trait]
impl SpeechInput for NoopSpeechInput {
    async fn start(&self, _events: HypothesisSender) -> Result<()> {
        Ok(())
    }

    async fn stop(&self) {}
}

/// Speech output that completes every utterance instantly and silently.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSpeechOutput;

#[async_trait]
impl SpeechOutput for NoopSpeechOutput {
    async fn speak(&self, turn: TurnId, _text: &str, done: OutcomeSender) -> Result<()> {
        let _ = done.send(SpeakOutcome {
            turn,
            success: true,
        });
        Ok(())
    }

    async fn stop(&self) {}
}
