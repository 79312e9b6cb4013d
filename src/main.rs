//! Terminal front end for the medical-assistant chat client.
//!
//! Reads commands and questions through a line editor and drives a
//! [`SessionController`] the way the web page's buttons would.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use dotenvy::dotenv;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use medassist_client::config::ClientConfig;
use medassist_client::gateway::{HttpGateway, Upload};
use medassist_client::i18n::{FilePreferences, PreferenceStore, Theme, Translator};
use medassist_client::prompt::{LineReader, split_command};
use medassist_client::render::{RenderCommand, RenderSink, RowHandle, TerminalSink};
use medassist_client::session::SessionController;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenv();

    let config = ClientConfig::load().context("Configuration error")?;
    init_tracing(&config);

    info!(
        name: "client.config.loaded",
        base_url = %config.backend.base_url,
        policy = ?config.language.policy,
        "Client configuration loaded"
    );

    let preferences: Arc<dyn PreferenceStore> =
        Arc::new(FilePreferences::open(&config.preferences.path));
    let backend = Arc::new(HttpGateway::new(&config.backend.base_url)?);
    let terminal = Arc::new(TerminalSink::new());
    let sink: Arc<dyn RenderSink> = Arc::clone(&terminal) as Arc<dyn RenderSink>;
    let translator = Arc::new(Translator::new(
        Arc::clone(&preferences),
        &config.language.default,
    ));

    let mut theme = Theme::restore(preferences.as_ref());
    sink.render(RenderCommand::ApplyTheme(theme));

    let controller = SessionController::new(
        backend,
        Arc::clone(&sink),
        translator,
        config.language.policy,
    );
    println!("{}", "=== Medical Assistant ===".bright_magenta().bold());
    controller.start().await;
    terminal.print_help();

    let mut reader = LineReader::spawn(">> ").context("Could not start line editor")?;
    while let Some(line) = reader.next_line().await {
        let (command, argument) = split_command(&line);

        match command {
            "" => {}
            "/quit" | "/exit" => break,
            "/help" => terminal.print_help(),
            "/new" => {
                controller.load_conversation(None).await;
            }
            "/history" => {
                controller.history().toggle().await;
            }
            "/open" => match row_handle(&controller, argument) {
                Some(handle) => {
                    controller.open_history_row(handle).await;
                }
                None => warn!(name: "cli.row.unknown", argument, "No such history row"),
            },
            "/delete" => match row_handle(&controller, argument) {
                Some(handle) => {
                    controller.history().request_delete(handle);
                }
                None => warn!(name: "cli.row.unknown", argument, "No such history row"),
            },
            "/yes" => {
                controller.confirm_delete().await;
            }
            "/no" => controller.cancel_delete(),
            "/upload" => {
                let upload = if argument.is_empty() {
                    None
                } else {
                    match Upload::from_path(argument).await {
                        Ok(upload) => Some(upload),
                        Err(e) => {
                            warn!(name: "cli.upload.unreadable", path = argument, error = %e);
                            None
                        }
                    }
                };
                controller.upload_file(upload).await;
            }
            "/lang" => {
                controller.set_language(argument).await;
            }
            "/news" => {
                controller.show_news().await;
            }
            "/theme" => {
                theme = theme.toggled();
                theme.persist(preferences.as_ref());
                sink.render(RenderCommand::ApplyTheme(theme));
            }
            "/logout" => {
                if controller.logout().await {
                    break;
                }
            }
            _ => {
                controller.send_text(&line).await;
            }
        }
    }

    let session = controller.snapshot();
    info!(
        name: "client.exit",
        active_conversation = ?session.active_conversation_id(),
        language = session.current_language(),
        "Client exiting"
    );
    Ok(())
}

fn init_tracing(config: &ClientConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so they never interleave with the transcript.
    if config.logging.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

fn row_handle(controller: &SessionController, argument: &str) -> Option<RowHandle> {
    let n: usize = argument.parse().ok()?;
    controller
        .history()
        .rows()
        .get(n.checked_sub(1)?)
        .map(|row| row.handle)
}
