//! Single-writer orchestration runtime.
//!
//! The runtime owns the [`ConversationModel`] outright. Recognizer events,
//! speak completions, gateway results, settings updates and front-end
//! commands all land on one queue, get folded through the reducer one at a
//! time, and the requested effects are executed before the next event is
//! taken. There is no other path to the model, so no locks either.
//!
//! Capability callbacks run on whatever task the capability likes; the
//! forwarder tasks here turn them into queued [`Event`]s. Gateway calls run
//! on their own task per turn, each with a child cancellation token so a
//! superseded turn can be abandoned without touching the runtime token.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ElzaConfig;
use crate::error::Result;
use crate::gateway::ReasoningGateway;
use crate::orchestrator::events::{Effect, Event};
use crate::orchestrator::reducer::transition;
use crate::orchestrator::state::{
    BehaviorFlags, ConversationModel, ConversationSnapshot, InteractionMode, TurnId,
};
use crate::settings::SettingsSnapshot;
use crate::voice::{HypothesisEvent, InputFault, SpeakOutcome, SpeechInput, SpeechOutput};

/// Cloneable front-end handle: feed commands in, watch snapshots come out.
///
/// Command methods never block and never fail; once the runtime is gone
/// they become no-ops.
#[derive(Clone)]
pub struct OrchestratorHandle {
    events: mpsc::UnboundedSender<Event>,
    snapshots: watch::Receiver<ConversationSnapshot>,
    cancel: CancellationToken,
}

impl OrchestratorHandle {
    /// Ask the assistant to start listening.
    pub fn start_listening(&self) {
        let _ = self.events.send(Event::ListenRequested);
    }

    /// Stop listening and speaking, abandoning any turn in flight.
    pub fn stop(&self) {
        let _ = self.events.send(Event::StopRequested);
    }

    /// Switch interaction mode.
    pub fn select_mode(&self, mode: InteractionMode) {
        let _ = self.events.send(Event::ModeSelected(mode));
    }

    /// Submit typed user input.
    pub fn submit_text(&self, text: impl Into<String>) {
        let _ = self.events.send(Event::TextSubmitted(text.into()));
    }

    /// Report that the platform granted microphone permission.
    pub fn permission_granted(&self) {
        let _ = self.events.send(Event::PermissionGranted);
    }

    /// Report that the platform denied microphone permission.
    pub fn permission_denied(&self) {
        let _ = self
            .events
            .send(Event::InputError(InputFault::PermissionDenied));
    }

    /// Watch channel carrying the latest [`ConversationSnapshot`].
    pub fn snapshots(&self) -> watch::Receiver<ConversationSnapshot> {
        self.snapshots.clone()
    }

    /// Tell the runtime to shut down and release both capabilities.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

/// Owns the conversation state machine and its event loop.
pub struct Orchestrator {
    locale: String,
    model: ConversationModel,
    gateway: Arc<ReasoningGateway>,
    input: Arc<dyn SpeechInput>,
    output: Arc<dyn SpeechOutput>,
    cancel: CancellationToken,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    snapshots_tx: watch::Sender<ConversationSnapshot>,
    snapshots_rx: watch::Receiver<ConversationSnapshot>,
    hypothesis_tx: mpsc::UnboundedSender<HypothesisEvent>,
    hypothesis_rx: Option<mpsc::UnboundedReceiver<HypothesisEvent>>,
    outcome_tx: mpsc::UnboundedSender<SpeakOutcome>,
    outcome_rx: Option<mpsc::UnboundedReceiver<SpeakOutcome>>,
    settings_rx: Option<watch::Receiver<SettingsSnapshot>>,
    /// Gateway call currently running, with its private cancellation token.
    inflight: Option<(TurnId, CancellationToken)>,
}

impl Orchestrator {
    /// Create an orchestrator with behavior seeded from `config`.
    pub fn new(
        config: &ElzaConfig,
        gateway: Arc<ReasoningGateway>,
        input: Arc<dyn SpeechInput>,
        output: Arc<dyn SpeechOutput>,
    ) -> Self {
        let flags = BehaviorFlags {
            barge_in_enabled: config.behavior.barge_in_enabled,
            muted: config.behavior.mute_default,
        };
        let model = ConversationModel::new(config.behavior.default_mode, flags);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshots_tx, snapshots_rx) = watch::channel(model.snapshot());
        let (hypothesis_tx, hypothesis_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            locale: config.locale.primary.clone(),
            model,
            gateway,
            input,
            output,
            cancel: CancellationToken::new(),
            events_tx,
            events_rx,
            snapshots_tx,
            snapshots_rx,
            hypothesis_tx,
            hypothesis_rx: Some(hypothesis_rx),
            outcome_tx,
            outcome_rx: Some(outcome_rx),
            settings_rx: None,
            inflight: None,
        }
    }

    /// Attach a settings store subscription.
    ///
    /// The current snapshot seeds the behavior flags immediately; later
    /// changes arrive as flag events through the normal queue.
    pub fn with_settings(mut self, rx: watch::Receiver<SettingsSnapshot>) -> Self {
        self.model.flags = rx.borrow().flags();
        self.settings_rx = Some(rx);
        self
    }

    /// Front-end handle. Any number may be created; all feed the same queue.
    pub fn handle(&self) -> OrchestratorHandle {
        OrchestratorHandle {
            events: self.events_tx.clone(),
            snapshots: self.snapshots_rx.clone(),
            cancel: self.cancel.clone(),
        }
    }

    /// Run the event loop until shut down via a handle.
    ///
    /// Both capabilities are stopped on the way out, whatever state the
    /// conversation was in.
    pub async fn run(mut self) -> Result<()> {
        info!(locale = %self.locale, mode = ?self.model.mode(), "conversation orchestrator starting");
        let _ = self.snapshots_tx.send_replace(self.model.snapshot());

        let forwarders = self.spawn_forwarders();
        let cancel = self.cancel.clone();

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("shutdown requested");
                    break;
                }
                event = self.events_rx.recv() => {
                    let Some(event) = event else { break };
                    self.handle_event(event).await;
                }
            }
        }

        // Teardown. Stops are idempotent, so no state check is needed.
        self.cancel.cancel();
        if let Some((turn, token)) = self.inflight.take() {
            debug!(%turn, "abandoning gateway call at shutdown");
            token.cancel();
        }
        self.output.stop().await;
        self.input.stop().await;
        for forwarder in forwarders {
            let _ = forwarder.await;
        }
        info!("conversation orchestrator stopped");
        Ok(())
    }

    /// Fold one event, run its effects, publish the new snapshot.
    async fn handle_event(&mut self, event: Event) {
        debug!(?event, "handling event");

        // The gateway task for this turn has finished; forget its token.
        if let Event::ReplyReady { turn, .. } = &event {
            if self.inflight.as_ref().is_some_and(|(t, _)| t == turn) {
                self.inflight = None;
            }
        }

        let before = self.model.phase();
        let step = transition(&self.model, event);
        self.model = step.model;
        let after = self.model.phase();
        if before != after {
            info!(from = %before, to = %after, "conversation state changed");
        }

        for effect in step.effects {
            self.apply_effect(effect).await;
        }
        let _ = self.snapshots_tx.send_replace(self.model.snapshot());
    }

    async fn apply_effect(&mut self, effect: Effect) {
        match effect {
            Effect::StartInput => {
                if let Err(e) = self.input.start(self.hypothesis_tx.clone()).await {
                    warn!(error = %e, "speech input failed to start");
                    let _ = self
                        .events_tx
                        .send(Event::InputError(InputFault::Device(e.to_string())));
                }
            }
            Effect::StopInput => self.input.stop().await,
            Effect::StopOutput => self.output.stop().await,
            Effect::Speak { turn, text } => {
                if let Err(e) = self.output.speak(turn, &text, self.outcome_tx.clone()).await {
                    warn!(error = %e, %turn, "speech output failed to start");
                    let _ = self
                        .events_tx
                        .send(Event::SpeakFinished { turn, success: false });
                }
            }
            Effect::ConsultGateway { turn, text } => self.consult_gateway(turn, text),
            Effect::CancelGateway { turn } => {
                if let Some((inflight, token)) = &self.inflight {
                    if *inflight == turn {
                        debug!(%turn, "cancelling superseded gateway call");
                        token.cancel();
                        self.inflight = None;
                    }
                }
            }
            Effect::Resume => {
                let _ = self.events_tx.send(Event::ListenRequested);
            }
        }
    }

    /// Ask the gateway on a dedicated task; the result comes back through
    /// the event queue tagged with `turn`.
    fn consult_gateway(&mut self, turn: TurnId, text: String) {
        let token = self.cancel.child_token();
        self.inflight = Some((turn, token.clone()));
        let gateway = Arc::clone(&self.gateway);
        let locale = self.locale.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {
                    debug!(%turn, "gateway call abandoned");
                }
                reply = gateway.reply_to(&text, &locale) => {
                    let _ = events.send(Event::ReplyReady {
                        turn,
                        text: reply.text,
                    });
                }
            }
        });
    }

    /// Bridge capability callbacks and settings updates onto the event queue.
    fn spawn_forwarders(&mut self) -> Vec<JoinHandle<()>> {
        let mut forwarders = Vec::new();

        if let Some(mut rx) = self.hypothesis_rx.take() {
            let events = self.events_tx.clone();
            let cancel = self.cancel.clone();
            forwarders.push(tokio::spawn(async move {
                loop {
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        hypothesis = rx.recv() => {
                            let Some(hypothesis) = hypothesis else { break };
                            let event = match hypothesis {
                                HypothesisEvent::Partial(text) => Event::PartialHypothesis(text),
                                HypothesisEvent::Final(text) => Event::FinalHypothesis(text),
                                HypothesisEvent::Status(line) => {
                                    debug!(status = %line, "speech input status");
                                    continue;
                                }
                                HypothesisEvent::Error(fault) => Event::InputError(fault),
                            };
                            if events.send(event).is_err() {
                                break;
                            }
                        }
                    }
                }
            }));
        }

        if let Some(mut rx) = self.outcome_rx.take() {
            let events = self.events_tx.clone();
            let cancel = self.cancel.clone();
            forwarders.push(tokio::spawn(async move {
                loop {
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        outcome = rx.recv() => {
                            let Some(SpeakOutcome { turn, success }) = outcome else { break };
                            if events.send(Event::SpeakFinished { turn, success }).is_err() {
                                break;
                            }
                        }
                    }
                }
            }));
        }

        if let Some(mut rx) = self.settings_rx.take() {
            let events = self.events_tx.clone();
            let cancel = self.cancel.clone();
            forwarders.push(tokio::spawn(async move {
                loop {
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        changed = rx.changed() => {
                            if changed.is_err() {
                                break;
                            }
                            let flags = rx.borrow_and_update().flags();
                            if events.send(Event::FlagsChanged(flags)).is_err() {
                                break;
                            }
                        }
                    }
                }
            }));
        }

        forwarders
    }
}
