//! Reasoning gateway: user text in, a speakable reply out. Always.
//!
//! The gateway routes between a pluggable [`ReasoningPort`] and a canned
//! lexicon, and it is infallible by contract: whatever the port does (fail,
//! time out, echo the prompt, return nothing), the caller gets back a short,
//! punctuated reply in the requested locale.
//!
//! # Reply pipeline
//!
//! 1. Normalize the prompt: trim, collapse whitespace runs.
//! 2. Empty prompt → "didn't catch that" phrase.
//! 3. Offline (per the connectivity probe) → offline phrase, with question
//!    and statement wordings told apart by a trailing `?`.
//! 4. Port configured → call it under the configured timeout. Errors and
//!    timeouts count as blank output. No port → honest "not configured"
//!    phrase.
//! 5. Every path then runs the same tail: output equal to the prompt
//!    (case-insensitive) is blanked as an echo, blank output falls back to
//!    the cannot-answer phrase, and terminal punctuation is appended when
//!    missing.

mod lexicon;
mod offline;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::GatewayConfig;
use crate::error::Result;

/// A finalized assistant reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub locale: String,
}

/// Port to any reasoning backend: remote LLM, local model, scripted test.
#[async_trait]
pub trait ReasoningPort: Send + Sync {
    /// Produce a short reply to `text` in `locale`.
    async fn reply(&self, text: &str, locale: &str) -> Result<String>;
}

/// Reports whether the reasoning backend is reachable right now.
///
/// Consulted once per turn; must be cheap and non-blocking.
pub trait ConnectivityProbe: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Connectivity probe that always reports online.
///
/// For embeddings with no meaningful connectivity signal (consoles, tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysOnline;

impl ConnectivityProbe for AlwaysOnline {
    fn is_online(&self) -> bool {
        true
    }
}

/// Routes prompts to the reasoning port or the canned lexicon.
pub struct ReasoningGateway {
    port: Option<Arc<dyn ReasoningPort>>,
    connectivity: Arc<dyn ConnectivityProbe>,
    reply_timeout: Duration,
}

impl ReasoningGateway {
    pub fn new(config: &GatewayConfig, connectivity: Arc<dyn ConnectivityProbe>) -> Self {
        Self {
            port: None,
            connectivity,
            reply_timeout: Duration::from_millis(config.reply_timeout_ms),
        }
    }

    /// Attach a reasoning port. Without one the gateway stays honest about
    /// having no reasoning engine.
    pub fn with_port(mut self, port: Arc<dyn ReasoningPort>) -> Self {
        self.port = Some(port);
        self
    }

    /// Resolve a reply for `prompt` in `locale`.
    ///
    /// Never fails, never returns blank text, never parrots the prompt back.
    pub async fn reply_to(&self, prompt: &str, locale: &str) -> Reply {
        let user = normalize(prompt);
        if user.is_empty() {
            return finish(lexicon::didnt_catch(locale).to_owned(), &user, locale);
        }

        if !self.connectivity.is_online() {
            debug!("reasoning backend offline; using canned reply");
            return finish(offline::message(&user, locale).to_owned(), &user, locale);
        }

        let Some(port) = &self.port else {
            return finish(lexicon::not_configured(&user, locale).to_owned(), &user, locale);
        };

        let raw = match tokio::time::timeout(self.reply_timeout, port.reply(&user, locale)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(error = %e, "reasoning port failed");
                String::new()
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.reply_timeout.as_millis() as u64,
                    "reasoning port timed out"
                );
                String::new()
            }
        };
        finish(raw, &user, locale)
    }
}

/// Shared tail of every path: de-echo, fall back if blank, punctuate.
fn finish(raw: String, user: &str, locale: &str) -> Reply {
    let cleaned = clean_against(raw.trim(), user);
    let text = ensure_punctuation(fallback_if_blank(cleaned, locale));
    Reply {
        text,
        locale: locale.to_owned(),
    }
}

/// Trim and collapse whitespace runs to single spaces.
fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Blank out replies that just repeat the prompt (case-insensitive).
fn clean_against(reply: &str, user: &str) -> String {
    if reply.is_empty() || reply.to_lowercase() == user.to_lowercase() {
        String::new()
    } else {
        reply.to_owned()
    }
}

fn fallback_if_blank(reply: String, locale: &str) -> String {
    if reply.is_empty() {
        lexicon::cannot_answer(locale).to_owned()
    } else {
        reply
    }
}

fn ensure_punctuation(text: String) -> String {
    match text.chars().last() {
        None | Some('.' | '!' | '?' | '…') => text,
        Some(_) => text + ".",
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::error::ElzaError;
    use std::sync::Mutex;

    struct FixedProbe(bool);

    impl ConnectivityProbe for FixedProbe {
        fn is_online(&self) -> bool {
            self.0
        }
    }

    struct ScriptedPort(&'static str);

    #[async_trait]
    impl ReasoningPort for ScriptedPort {
        async fn reply(&self, _text: &str, _locale: &str) -> Result<String> {
            Ok(self.0.to_owned())
        }
    }

    struct EchoPort;

    #[async_trait]
    impl ReasoningPort for EchoPort {
        async fn reply(&self, text: &str, _locale: &str) -> Result<String> {
            Ok(text.to_uppercase())
        }
    }

    struct FailingPort;

    #[async_trait]
    impl ReasoningPort for FailingPort {
        async fn reply(&self, _text: &str, _locale: &str) -> Result<String> {
            Err(ElzaError::Reasoning("backend unavailable".to_owned()))
        }
    }

    struct SlowPort;

    #[async_trait]
    impl ReasoningPort for SlowPort {
        async fn reply(&self, _text: &str, _locale: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok("too late".to_owned())
        }
    }

    /// Records the prompt it was handed, then answers.
    struct CapturingPort {
        seen: Mutex<Option<String>>,
    }

    #[async_trait]
    impl ReasoningPort for CapturingPort {
        async fn reply(&self, text: &str, _locale: &str) -> Result<String> {
            *self.seen.lock().unwrap() = Some(text.to_owned());
            Ok("Labi.".to_owned())
        }
    }

    fn gateway(online: bool) -> ReasoningGateway {
        ReasoningGateway::new(&GatewayConfig::default(), Arc::new(FixedProbe(online)))
    }

    fn has_terminal_punctuation(text: &str) -> bool {
        matches!(text.chars().last(), Some('.' | '!' | '?' | '…'))
    }

    #[tokio::test]
    async fn empty_prompt_asks_to_repeat() {
        let reply = gateway(true).reply_to("   ", "lv-LV").await;
        assert_eq!(reply.text, "Nesadzirdēju. Vari atkārtot?");
        assert_eq!(reply.locale, "lv-LV");

        let reply = gateway(true).reply_to("", "en-US").await;
        assert_eq!(reply.text, "I didn't catch that. Can you repeat?");
    }

    #[tokio::test]
    async fn offline_question_is_answered_with_offline_phrase() {
        let reply = gateway(false).reply_to("Kāds šodien laiks?", "lv-LV").await;
        assert_eq!(
            reply.text,
            "Pašlaik esmu bezsaistē, tāpēc nevaru sniegt pilnu atbildi. Pieslēdzot tīklu, mēģināšu atbildēt."
        );
    }

    #[tokio::test]
    async fn offline_statement_gets_statement_wording() {
        let reply = gateway(false).reply_to("šodien līst", "lv-LV").await;
        assert_eq!(
            reply.text,
            "Pašlaik esmu bezsaistē. Kad būs savienojums, varēšu palīdzēt precīzāk."
        );

        let reply = gateway(false).reply_to("it is raining", "en-US").await;
        assert_eq!(
            reply.text,
            "I’m offline right now. When connection is available, I’ll help more precisely."
        );
    }

    #[tokio::test]
    async fn online_without_port_is_honest_about_it() {
        let reply = gateway(true).reply_to("sveika, Elza", "lv-LV").await;
        assert_eq!(
            reply.text,
            "Sapratu. Kad pieslēgsim domāšanas motoru, varēšu atbildēt saprātīgi."
        );

        let reply = gateway(true).reply_to("who are you?", "en-US").await;
        assert_eq!(
            reply.text,
            "Reasoning engine not configured. Once enabled, I’ll provide a full answer."
        );
    }

    #[tokio::test]
    async fn port_reply_gains_terminal_punctuation() {
        let gw = gateway(true).with_port(Arc::new(ScriptedPort("It is three o'clock")));
        let reply = gw.reply_to("What time is it?", "en-US").await;
        assert_eq!(reply.text, "It is three o'clock.");
    }

    #[tokio::test]
    async fn existing_punctuation_is_kept() {
        let gw = gateway(true).with_port(Arc::new(ScriptedPort("Labdien!")));
        let reply = gw.reply_to("sveiki", "lv-LV").await;
        assert_eq!(reply.text, "Labdien!");
    }

    #[tokio::test]
    async fn echoed_prompt_is_replaced_with_fallback() {
        let gw = gateway(true).with_port(Arc::new(EchoPort));
        let reply = gw.reply_to("kā tev iet", "lv-LV").await;
        assert_eq!(reply.text, "Nevaru atbildēt šobrīd.");
    }

    #[tokio::test]
    async fn port_failure_falls_back() {
        let gw = gateway(true).with_port(Arc::new(FailingPort));
        let reply = gw.reply_to("what now?", "en-US").await;
        assert_eq!(reply.text, "I cannot answer right now.");
    }

    #[tokio::test]
    async fn port_timeout_falls_back() {
        let config = GatewayConfig {
            reply_timeout_ms: 50,
        };
        let gw = ReasoningGateway::new(&config, Arc::new(FixedProbe(true)))
            .with_port(Arc::new(SlowPort));
        let reply = gw.reply_to("vai tu dzirdi?", "lv-LV").await;
        assert_eq!(reply.text, "Nevaru atbildēt šobrīd.");
    }

    #[tokio::test]
    async fn prompt_whitespace_is_collapsed_before_the_port() {
        let port = Arc::new(CapturingPort {
            seen: Mutex::new(None),
        });
        let gw = gateway(true).with_port(port.clone());
        let _ = gw.reply_to("  kā   tev\tiet  ", "lv-LV").await;
        assert_eq!(port.seen.lock().unwrap().as_deref(), Some("kā tev iet"));
    }

    #[tokio::test]
    async fn every_path_yields_punctuated_nonblank_text() {
        let replies = [
            gateway(true).reply_to("", "lv-LV").await,
            gateway(false).reply_to("sveiki", "lv-LV").await,
            gateway(true).reply_to("sveiki", "lv-LV").await,
            gateway(true)
                .with_port(Arc::new(ScriptedPort("atbilde bez punkta")))
                .reply_to("jautājums", "lv-LV")
                .await,
            gateway(true)
                .with_port(Arc::new(FailingPort))
                .reply_to("jautājums", "lv-LV")
                .await,
        ];
        for reply in replies {
            assert!(!reply.text.trim().is_empty());
            assert!(has_terminal_punctuation(&reply.text), "{}", reply.text);
        }
    }

    #[tokio::test]
    async fn reply_never_equals_prompt_case_insensitively() {
        let gw = gateway(true).with_port(Arc::new(EchoPort));
        for prompt in ["sveiki", "KĀDS LAIKS", "Hello there"] {
            let reply = gw.reply_to(prompt, "lv-LV").await;
            assert_ne!(reply.text.to_lowercase(), prompt.to_lowercase());
        }
    }
}
