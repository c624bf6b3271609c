pub mod app;
pub mod render;

use crossterm::event::{
    DisableBracketedPaste,
    DisableMouseCapture,
    EnableBracketedPaste,
    EnableMouseCapture,
    EventStream,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode,
    enable_raw_mode,
    EnterAlternateScreen,
    LeaveAlternateScreen,
};
use futures::StreamExt;
use log::info;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::error::Error;
use std::io::{ self, Stdout };
use std::time::Duration;
use crate::controller::ChatController;
use crate::view::SharedTranscript;
use self::app::{ App, Control };

const REDRAW_INTERVAL: Duration = Duration::from_millis(100);

pub struct Ui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl Ui {
    pub fn init() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }

    /// Runs until the user quits. Answers arriving in the background show up
    /// on the next redraw.
    pub async fn run(&mut self, app: &mut App) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut events = EventStream::new();
        let mut redraw = tokio::time::interval(REDRAW_INTERVAL);

        loop {
            self.terminal.draw(|frame| render::draw(frame, app))?;

            tokio::select! {
                maybe_event = events.next() => {
                    match maybe_event {
                        Some(Ok(event)) => {
                            if app.handle_event(&event) == Control::Quit {
                                break;
                            }
                        }
                        Some(Err(e)) => return Err(e.into()),
                        None => break,
                    }
                }
                _ = redraw.tick() => {}
            }
        }

        Ok(())
    }
}

impl Drop for Ui {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            DisableBracketedPaste,
            DisableMouseCapture,
            LeaveAlternateScreen
        );
        let _ = self.terminal.show_cursor();
    }
}

pub async fn run_interactive(
    controller: ChatController,
    transcript: SharedTranscript
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut app = App::new(controller, transcript);
    let mut ui = Ui::init()?;
    let result = ui.run(&mut app).await;
    drop(ui);

    app.abort_pending();
    if let Some(chat_id) = app.controller().chat_id() {
        info!("Leaving conversation {}", chat_id);
        println!("Conversation id: {}", chat_id);
    }
    result
}
