//! Runtime-tunable user settings, published as a watch stream.
//!
//! The store is the in-process source of truth for user preferences. The
//! orchestrator subscribes and mirrors the behavior flags into its model;
//! speech capability implementations read the tuning fields they care
//! about. Persistence is the embedder's job: seed the store at startup and
//! mirror updates back to wherever preferences live.

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::config::ElzaConfig;
use crate::orchestrator::BehaviorFlags;

/// Full settings snapshot. Every change republishes the whole thing.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsSnapshot {
    // Behavior
    /// Whether the user may interrupt the assistant mid-sentence.
    pub barge_in_enabled: bool,
    /// Replies are shown but never spoken.
    pub muted: bool,

    // Appearance
    pub dark_theme: bool,

    // Speech input tuning
    /// Voice activity detection sensitivity, 0.0 (deaf) to 1.0 (hair-trigger).
    pub vad_sensitivity: f32,
    /// Silence duration that ends an utterance, in milliseconds.
    pub endpoint_ms: u32,
    /// Microphone gain adjustment in dB.
    pub input_gain_db: i32,

    // Speech output
    /// Synthesis voice identifier.
    pub voice_id: String,
    /// Speech rate multiplier.
    pub speech_rate: f32,
    /// Pitch offset in semitones.
    pub speech_pitch: f32,
}

impl Default for SettingsSnapshot {
    fn default() -> Self {
        Self {
            barge_in_enabled: false,
            muted: false,
            dark_theme: false,
            vad_sensitivity: 0.5,
            endpoint_ms: 1500,
            input_gain_db: 0,
            voice_id: "lv-LV-EveritaNeural".to_owned(),
            speech_rate: 1.0,
            speech_pitch: 0.0,
        }
    }
}

impl SettingsSnapshot {
    /// The slice of settings the conversation state machine mirrors.
    pub fn flags(&self) -> BehaviorFlags {
        BehaviorFlags {
            barge_in_enabled: self.barge_in_enabled,
            muted: self.muted,
        }
    }
}

/// In-process settings store with change notification.
pub struct SettingsStore {
    tx: watch::Sender<SettingsSnapshot>,
}

impl SettingsStore {
    pub fn new(initial: SettingsSnapshot) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    /// Store seeded with the behavior defaults from `config`.
    pub fn seeded_from(config: &ElzaConfig) -> Self {
        Self::new(SettingsSnapshot {
            barge_in_enabled: config.behavior.barge_in_enabled,
            muted: config.behavior.mute_default,
            ..SettingsSnapshot::default()
        })
    }

    /// Current values.
    pub fn snapshot(&self) -> SettingsSnapshot {
        self.tx.borrow().clone()
    }

    /// Subscribe for change notifications. The receiver starts on the
    /// current snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SettingsSnapshot> {
        self.tx.subscribe()
    }

    /// The subscription as a `Stream` of snapshots.
    pub fn stream(&self) -> WatchStream<SettingsSnapshot> {
        WatchStream::new(self.tx.subscribe())
    }

    // Behavior

    pub fn set_barge_in_enabled(&self, enabled: bool) {
        self.tx.send_modify(|s| s.barge_in_enabled = enabled);
    }

    pub fn set_muted(&self, muted: bool) {
        self.tx.send_modify(|s| s.muted = muted);
    }

    // Appearance

    pub fn set_dark_theme(&self, enabled: bool) {
        self.tx.send_modify(|s| s.dark_theme = enabled);
    }

    // Speech input tuning

    pub fn set_vad_sensitivity(&self, value: f32) {
        self.tx.send_modify(|s| s.vad_sensitivity = value.clamp(0.0, 1.0));
    }

    pub fn set_endpoint_ms(&self, value: u32) {
        self.tx.send_modify(|s| s.endpoint_ms = value);
    }

    pub fn set_input_gain_db(&self, value: i32) {
        self.tx.send_modify(|s| s.input_gain_db = value);
    }

    // Speech output

    pub fn set_voice(&self, id: impl Into<String>) {
        let id = id.into();
        self.tx.send_modify(|s| s.voice_id = id);
    }

    pub fn set_speech_rate(&self, value: f32) {
        self.tx.send_modify(|s| s.speech_rate = value);
    }

    pub fn set_speech_pitch(&self, value: f32) {
        self.tx.send_modify(|s| s.speech_pitch = value);
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(SettingsSnapshot::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use tokio_stream::StreamExt;

    #[test]
    fn defaults_match_the_shipping_voice() {
        let snapshot = SettingsSnapshot::default();
        assert!(!snapshot.barge_in_enabled);
        assert!(!snapshot.muted);
        assert_eq!(snapshot.voice_id, "lv-LV-EveritaNeural");
        assert_eq!(snapshot.endpoint_ms, 1500);
    }

    #[test]
    fn config_seeds_behavior_fields() {
        let mut config = ElzaConfig::default();
        config.behavior.barge_in_enabled = true;
        config.behavior.mute_default = true;
        let store = SettingsStore::seeded_from(&config);
        let snapshot = store.snapshot();
        assert!(snapshot.barge_in_enabled);
        assert!(snapshot.muted);
        // Non-behavior fields stay on their defaults.
        assert_eq!(snapshot.voice_id, "lv-LV-EveritaNeural");
    }

    #[test]
    fn flags_project_the_behavior_slice() {
        let store = SettingsStore::default();
        store.set_barge_in_enabled(true);
        let flags = store.snapshot().flags();
        assert!(flags.barge_in_enabled);
        assert!(!flags.muted);
    }

    #[test]
    fn vad_sensitivity_is_clamped() {
        let store = SettingsStore::default();
        store.set_vad_sensitivity(7.0);
        assert_eq!(store.snapshot().vad_sensitivity, 1.0);
        store.set_vad_sensitivity(-1.0);
        assert_eq!(store.snapshot().vad_sensitivity, 0.0);
    }

    #[tokio::test]
    async fn setters_notify_subscribers() {
        let store = SettingsStore::default();
        let mut rx = store.subscribe();
        rx.mark_unchanged();

        store.set_muted(true);
        rx.changed().await.unwrap();
        assert!(rx.borrow().muted);

        store.set_voice("lv-LV-NilsNeural");
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().voice_id, "lv-LV-NilsNeural");
    }

    #[tokio::test]
    async fn stream_yields_current_then_updates() {
        let store = SettingsStore::default();
        let mut stream = store.stream();

        let first = stream.next().await.unwrap();
        assert!(!first.dark_theme);

        store.set_dark_theme(true);
        let second = stream.next().await.unwrap();
        assert!(second.dark_theme);
    }
}
