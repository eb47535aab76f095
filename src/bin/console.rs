//! Interactive text console for the assistant runtime.
//!
//! Reads user turns line-by-line from stdin, feeds them to the
//! orchestrator in text mode, and prints assistant replies to stdout.
//! Tracing goes to stderr so stdout stays a clean transcript.
//!
//! Commands: `/mute`, `/unmute`, `/quit` (or EOF).

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use elza::orchestrator::{MessageId, Role};
use elza::voice::{NoopSpeechInput, NoopSpeechOutput};
use elza::{AlwaysOnline, ElzaConfig, InteractionMode, Orchestrator, ReasoningGateway, SettingsStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Tracing to stderr only (stdout is reserved for the conversation).
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config_path = ElzaConfig::default_config_path();
    let config = if config_path.exists() {
        match ElzaConfig::from_file(&config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, path = %config_path.display(), "config unreadable, using defaults");
                ElzaConfig::default()
            }
        }
    } else {
        ElzaConfig::default()
    };

    let reply_prefix = config.console.reply_prefix.clone();
    let settings = SettingsStore::seeded_from(&config);
    // No reasoning port attached: the gateway answers with its
    // not-configured phrasing, which is enough to exercise the loop.
    let gateway = Arc::new(ReasoningGateway::new(
        &config.gateway,
        Arc::new(AlwaysOnline),
    ));

    let orchestrator = Orchestrator::new(
        &config,
        gateway,
        Arc::new(NoopSpeechInput),
        Arc::new(NoopSpeechOutput),
    )
    .with_settings(settings.subscribe());
    let handle = orchestrator.handle();

    let runtime = tokio::spawn(orchestrator.run());
    handle.select_mode(InteractionMode::Text);

    // Print each assistant reply exactly once, as it lands in the transcript.
    let mut snapshots = handle.snapshots();
    let printer = tokio::spawn(async move {
        let mut last_printed: Option<MessageId> = None;
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            for message in &snapshot.messages {
                if message.sender == Role::Assistant
                    && !message.is_placeholder
                    && last_printed.is_none_or(|id| message.id > id)
                {
                    println!("{reply_prefix}{}", message.text);
                    last_printed = Some(message.id);
                }
            }
        }
    });

    let stdin = tokio::io::stdin();
    let mut reader = BufReader::new(stdin);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;

        // EOF
        if bytes_read == 0 {
            break;
        }

        let trimmed = line.trim();
        match trimmed {
            "" => continue,
            "/quit" | "/exit" => break,
            "/mute" => settings.set_muted(true),
            "/unmute" => settings.set_muted(false),
            text => handle.submit_text(text),
        }
    }

    handle.shutdown();
    runtime.await??;
    let _ = printer.await;
    Ok(())
}
