use clap::builder::FalseyValueParser;
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Message to send once; the answer is printed and the program exits.
    /// Without it the interactive chat window opens.
    #[arg(value_name = "MESSAGE")]
    pub message: Option<String>,

    // --- Backend Args ---
    /// Base URL of the chat backend; requests go to <api-url>/api/chat
    #[arg(long, env = "CHAT_API_URL", default_value = "http://localhost:5000")]
    pub api_url: String,

    /// Conversation id to continue instead of starting a new conversation.
    #[arg(long, env = "CHAT_ID")]
    pub chat_id: Option<String>,

    /// Per-request timeout in seconds. 0 waits forever.
    #[arg(long, env = "CHAT_TIMEOUT_SECS", default_value = "0")]
    pub timeout_secs: u64,

    // --- General App Args ---
    /// Write logs to this file instead of stderr.
    #[arg(long, env = "CHAT_LOG_FILE")]
    pub log_file: Option<String>,

    /// Enable debug logging/output. `DEBUG=1` works as well as `DEBUG=true`.
    #[arg(long, env = "DEBUG", default_value = "false", value_parser = FalseyValueParser::new())]
    pub debug: bool,

    /// Print without colors in one-shot mode. Any non-empty `NO_COLOR` other
    /// than `0`/`false`/`no`/`off` turns colors off.
    #[arg(long, env = "NO_COLOR", default_value = "false", value_parser = FalseyValueParser::new())]
    pub no_color: bool,
}

impl Args {
    pub fn is_interactive(&self) -> bool {
        self.message.is_none()
    }
}
