use chatbox::cli::Args;
use chatbox::error::ChatError;
use clap::Parser;
use dotenv::dotenv;
use log::error;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    let args = Args::parse();

    if let Err(e) = chatbox::init_logging(&args) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    match chatbox::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            // Failed turns are already on screen as an error entry.
            if e.downcast_ref::<ChatError>().is_none() {
                eprintln!("Error: {}", e);
            }
            ExitCode::FAILURE
        }
    }
}
