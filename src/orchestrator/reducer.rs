//! The conversation state machine, as a pure reducer.
//!
//! [`transition`] folds one [`Event`] over a [`ConversationModel`] and
//! returns the next model plus the effects the runtime must execute. No I/O
//! happens here, so every turn-taking rule is testable with plain values.
//!
//! Completion events carry the turn that produced them and are dropped when
//! that turn is no longer the one in flight. That is the whole story for
//! late gateway replies and late speak callbacks after a barge-in, a stop,
//! or a mode switch.

use crate::orchestrator::echo::SpokenTextMemo;
use crate::orchestrator::events::{Effect, Event};
use crate::orchestrator::state::{
    BehaviorFlags, ConversationModel, ConversationState, InteractionMode, PendingReply, Role,
    StatusIndicator, TurnId,
};
use crate::voice::InputFault;

/// Outcome of folding one event: the next model and the effects to run,
/// in order.
#[derive(Debug)]
pub struct Step {
    pub model: ConversationModel,
    pub effects: Vec<Effect>,
}

impl Step {
    fn stay(model: ConversationModel) -> Self {
        Self {
            model,
            effects: Vec::new(),
        }
    }

    fn then(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Fold one event over the model.
pub fn transition(model: &ConversationModel, event: Event) -> Step {
    match event {
        Event::ListenRequested => listen_requested(model),
        Event::StopRequested => stop_requested(model),
        Event::ModeSelected(mode) => mode_selected(model, mode),
        Event::TextSubmitted(text) => text_submitted(model, text),
        Event::PartialHypothesis(text) => partial_hypothesis(model, &text),
        Event::FinalHypothesis(text) => final_hypothesis(model, &text),
        Event::InputError(fault) => input_error(model, fault),
        Event::PermissionGranted => permission_granted(model),
        Event::ReplyReady { turn, text } => reply_ready(model, turn, text),
        Event::SpeakFinished { turn, success } => speak_finished(model, turn, success),
        Event::FlagsChanged(flags) => flags_changed(model, flags),
    }
}

/// Status shown when the conversation returns to idle.
fn idle_status(model: &ConversationModel) -> StatusIndicator {
    if model.permission_denied {
        StatusIndicator::MicPermissionNeeded
    } else {
        StatusIndicator::Ready
    }
}

/// Tear down everything that may be in flight, from any state.
fn abort_effects(model: &ConversationModel) -> Vec<Effect> {
    let mut effects = vec![Effect::StopInput, Effect::StopOutput];
    if let ConversationState::Thinking { pending } = &model.state {
        effects.push(Effect::CancelGateway { turn: pending.turn });
    }
    effects
}

/// Re-enter listening after a concluded turn, unless listening is blocked.
fn resume_effects(next: &ConversationModel) -> Vec<Effect> {
    if next.permission_denied || next.mode == InteractionMode::SettingsView {
        Vec::new()
    } else {
        vec![Effect::Resume]
    }
}

/// Open a new turn for `text`: transcript entry, placeholder bubble,
/// gateway call. Overwrites whatever state (and pending turn) came before.
fn begin_turn(next: &mut ConversationModel, text: String, effects: &mut Vec<Effect>) {
    next.append(Role::User, text.clone());
    let turn = next.mint_turn();
    let placeholder = next.mint_placeholder();
    next.state = ConversationState::Thinking {
        pending: PendingReply { turn, placeholder },
    };
    next.status = StatusIndicator::Thinking;
    effects.push(Effect::ConsultGateway { turn, text });
}

fn listen_requested(model: &ConversationModel) -> Step {
    if model.mode == InteractionMode::SettingsView {
        return Step::stay(model.clone());
    }
    if model.permission_denied {
        let mut next = model.clone();
        next.status = StatusIndicator::MicPermissionNeeded;
        return Step::stay(next);
    }
    match model.state {
        ConversationState::Idle => {
            let mut next = model.clone();
            next.state = ConversationState::Listening;
            next.status = StatusIndicator::Listening;
            Step::stay(next).then(Effect::StartInput)
        }
        // Already listening, or a turn is in flight; interruptions go
        // through barge-in or an explicit stop.
        _ => Step::stay(model.clone()),
    }
}

fn stop_requested(model: &ConversationModel) -> Step {
    let effects = abort_effects(model);
    let mut next = model.clone();
    next.state = ConversationState::Idle;
    next.status = idle_status(&next);
    Step { model: next, effects }
}

fn mode_selected(model: &ConversationModel, mode: InteractionMode) -> Step {
    let effects = abort_effects(model);
    let mut next = model.clone();
    next.mode = mode;
    next.state = ConversationState::Idle;
    next.status = idle_status(&next);
    Step { model: next, effects }
}

fn text_submitted(model: &ConversationModel, text: String) -> Step {
    if model.mode == InteractionMode::SettingsView {
        return Step::stay(model.clone());
    }
    let text = text.trim().to_owned();
    if text.is_empty() {
        return Step::stay(model.clone());
    }
    let mut effects = Vec::new();
    match &model.state {
        ConversationState::Idle => {}
        ConversationState::Listening => effects.push(Effect::StopInput),
        ConversationState::Thinking { pending } => {
            effects.push(Effect::CancelGateway { turn: pending.turn });
        }
        ConversationState::Speaking { .. } => {
            effects.push(Effect::StopOutput);
            effects.push(Effect::StopInput);
        }
    }
    let mut next = model.clone();
    begin_turn(&mut next, text, &mut effects);
    Step { model: next, effects }
}

fn partial_hypothesis(model: &ConversationModel, text: &str) -> Step {
    if !matches!(model.state, ConversationState::Listening) {
        return Step::stay(model.clone());
    }
    let trimmed = text.trim();
    let mut next = model.clone();
    next.status = if trimmed.is_empty() {
        StatusIndicator::Listening
    } else {
        StatusIndicator::Hearing(trimmed.to_owned())
    };
    Step::stay(next)
}

fn final_hypothesis(model: &ConversationModel, text: &str) -> Step {
    let trimmed = text.trim();
    match &model.state {
        ConversationState::Listening => {
            if trimmed.is_empty() {
                let mut next = model.clone();
                next.status = StatusIndicator::Listening;
                return Step::stay(next);
            }
            let mut next = model.clone();
            let mut effects = vec![Effect::StopInput];
            begin_turn(&mut next, trimmed.to_owned(), &mut effects);
            Step { model: next, effects }
        }
        ConversationState::Thinking { pending } => {
            // A newer utterance supersedes the turn in flight; its reply,
            // if one still arrives, dies on the turn-id check.
            if trimmed.is_empty() {
                return Step::stay(model.clone());
            }
            let mut effects = vec![
                Effect::CancelGateway { turn: pending.turn },
                Effect::StopInput,
            ];
            let mut next = model.clone();
            begin_turn(&mut next, trimmed.to_owned(), &mut effects);
            Step { model: next, effects }
        }
        ConversationState::Speaking { spoken, .. } => {
            if spoken.is_echo(text) {
                return Step::stay(model.clone());
            }
            if !model.flags.barge_in_enabled {
                return Step::stay(model.clone());
            }
            let mut effects = vec![Effect::StopOutput, Effect::StopInput];
            let mut next = model.clone();
            begin_turn(&mut next, trimmed.to_owned(), &mut effects);
            Step { model: next, effects }
        }
        // Finals arriving after a stop belong to a session the user ended.
        ConversationState::Idle => Step::stay(model.clone()),
    }
}

fn input_error(model: &ConversationModel, fault: InputFault) -> Step {
    let effects = abort_effects(model);
    let mut next = model.clone();
    next.state = ConversationState::Idle;
    match fault {
        InputFault::PermissionDenied => {
            next.permission_denied = true;
            next.status = StatusIndicator::MicPermissionNeeded;
        }
        InputFault::Device(reason) => {
            next.status = StatusIndicator::InputFailed(reason);
        }
    }
    Step { model: next, effects }
}

fn permission_granted(model: &ConversationModel) -> Step {
    let mut next = model.clone();
    next.permission_denied = false;
    if matches!(next.state, ConversationState::Idle)
        && next.status == StatusIndicator::MicPermissionNeeded
    {
        next.status = StatusIndicator::Ready;
    }
    Step::stay(next)
}

fn reply_ready(model: &ConversationModel, turn: TurnId, text: String) -> Step {
    let ConversationState::Thinking { pending } = &model.state else {
        return Step::stay(model.clone());
    };
    if pending.turn != turn {
        return Step::stay(model.clone());
    }
    let reply = text.trim().to_owned();
    let mut next = model.clone();
    if reply.is_empty() {
        next.state = ConversationState::Idle;
        next.status = StatusIndicator::ReplyFailed;
        let effects = resume_effects(&next);
        return Step { model: next, effects };
    }
    if next.mode.speaks_replies() && !next.flags.muted {
        let pending = pending.clone();
        next.state = ConversationState::Speaking {
            pending,
            spoken: SpokenTextMemo::new(reply.clone()),
        };
        next.status = StatusIndicator::Speaking;
        let mut effects = vec![Effect::Speak { turn, text: reply }];
        if next.flags.barge_in_enabled {
            effects.push(Effect::StartInput);
        }
        return Step { model: next, effects };
    }
    // Muted or text-only: the reply goes straight to the transcript.
    next.append(Role::Assistant, reply);
    next.state = ConversationState::Idle;
    next.status = idle_status(&next);
    let effects = resume_effects(&next);
    Step { model: next, effects }
}

fn speak_finished(model: &ConversationModel, turn: TurnId, success: bool) -> Step {
    let ConversationState::Speaking { pending, spoken } = &model.state else {
        return Step::stay(model.clone());
    };
    if pending.turn != turn {
        return Step::stay(model.clone());
    }
    let mut next = model.clone();
    if success {
        let text = spoken.text().to_owned();
        next.append(Role::Assistant, text);
        next.state = ConversationState::Idle;
        next.status = idle_status(&next);
    } else {
        // The reply was cut off; no transcript entry for words never said.
        next.state = ConversationState::Idle;
        next.status = StatusIndicator::SpeechFailed;
    }
    // Barge-in may have left the recognizer running; the resume path
    // restarts it from a clean stop.
    let mut effects = vec![Effect::StopInput];
    effects.extend(resume_effects(&next));
    Step { model: next, effects }
}

fn flags_changed(model: &ConversationModel, flags: BehaviorFlags) -> Step {
    // Applies to decisions from here on; nothing already in flight moves.
    let mut next = model.clone();
    next.flags = flags;
    Step::stay(next)
}
