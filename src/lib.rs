pub mod cli;
pub mod client;
pub mod controller;
pub mod error;
pub mod models;
pub mod session;
pub mod tui;
pub mod view;

use cli::Args;
use controller::ChatController;
use log::info;
use models::chat::ChatId;
use std::error::Error;
use std::fs::OpenOptions;
use std::sync::Arc;
use view::{ InputField, SharedTranscript, StdoutView };

/// Sets up `env_logger`. The interactive window owns the terminal, so there
/// logs stay off unless they go to a file or `RUST_LOG` asks for them.
pub fn init_logging(args: &Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let default_level = if args.debug {
        "debug"
    } else if args.is_interactive() && args.log_file.is_none() {
        "off"
    } else {
        "info"
    };

    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_level)
    );
    if let Some(path) = &args.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| format!("Failed to open log file '{}': {}", path, e))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    // Not a failed turn: nothing has been rendered for it yet.
    let transport = client::new_client(&args).map_err(|e| e.to_string())?;

    info!("--- Chat Configuration ---");
    info!("Endpoint: {}", transport.endpoint());
    info!("Resume Conversation: {}", args.chat_id.as_deref().unwrap_or("(new)"));
    info!(
        "Request Timeout: {}",
        match args.timeout_secs {
            0 => "none".to_string(),
            secs => format!("{}s", secs),
        }
    );
    info!("Mode: {}", if args.is_interactive() { "interactive" } else { "one-shot" });
    info!("-------------------------");

    let chat_id = args.chat_id.as_deref().map(ChatId::from);

    match args.message {
        Some(message) => {
            let view = Arc::new(StdoutView::new(!args.no_color));
            let controller = ChatController::new(transport, view.clone(), chat_id);
            let mut input = InputField::from(message);
            match controller.handle_submit(&mut input).await {
                None => Err("Nothing to send: the message is empty".into()),
                Some(Err(e)) => Err(e.into()),
                Some(Ok(())) => {
                    if let Some(e) = view.take_error() {
                        return Err(format!("Failed to write the answer: {}", e).into());
                    }
                    if let Some(id) = controller.chat_id() {
                        info!("Continue this conversation with --chat-id {}", id);
                    }
                    Ok(())
                }
            }
        }
        None => {
            let transcript = SharedTranscript::new();
            let controller = ChatController::new(
                transport,
                Arc::new(transcript.clone()),
                chat_id
            );
            tui::run_interactive(controller, transcript).await
        }
    }
}
