use crossterm::event::{
    Event,
    KeyCode,
    KeyEvent,
    KeyEventKind,
    KeyModifiers,
    MouseButton,
    MouseEvent,
    MouseEventKind,
};
use ratatui::layout::Rect;
use tokio::task::JoinHandle;
use crate::controller::ChatController;
use crate::view::{ InputField, SharedTranscript };

const SCROLL_STEP: usize = 3;
const PAGE_STEP: usize = 10;

/// What set off a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    SendButton,
    EnterKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Submit(Gesture),
    Edit(Edit),
    Scroll(isize),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Insert(char),
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Screen regions from the last draw, used for mouse hit testing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Regions {
    pub chat_box: Rect,
    pub user_input: Rect,
    pub send_btn: Rect,
}

pub struct App {
    pub input: InputField,
    pub regions: Regions,
    controller: ChatController,
    transcript: SharedTranscript,
    tasks: Vec<JoinHandle<()>>,
}

impl App {
    pub fn new(controller: ChatController, transcript: SharedTranscript) -> Self {
        Self {
            input: InputField::new(),
            regions: Regions::default(),
            controller,
            transcript,
            tasks: Vec::new(),
        }
    }

    pub fn controller(&self) -> &ChatController {
        &self.controller
    }

    pub fn transcript(&self) -> &SharedTranscript {
        &self.transcript
    }

    pub fn map_event(&self, event: &Event) -> Action {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => map_key(key),
            Event::Mouse(mouse) => self.map_mouse(mouse),
            _ => Action::None,
        }
    }

    fn map_mouse(&self, mouse: &MouseEvent) -> Action {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) if
                hit(self.regions.send_btn, mouse.column, mouse.row)
            => Action::Submit(Gesture::SendButton),
            MouseEventKind::ScrollUp if hit(self.regions.chat_box, mouse.column, mouse.row) => {
                Action::Scroll(SCROLL_STEP as isize)
            }
            MouseEventKind::ScrollDown if hit(self.regions.chat_box, mouse.column, mouse.row) => {
                Action::Scroll(-(SCROLL_STEP as isize))
            }
            _ => Action::None,
        }
    }

    pub fn perform(&mut self, action: Action) -> Control {
        match action {
            Action::None => {}
            Action::Quit => {
                return Control::Quit;
            }
            Action::Submit(_) => {
                // Button and Enter share one path.
                self.tasks.retain(|task| !task.is_finished());
                if let Some(task) = self.controller.dispatch(&mut self.input) {
                    self.tasks.push(task);
                }
            }
            Action::Edit(edit) => self.edit(edit),
            Action::Scroll(lines) => {
                let mut transcript = self.transcript.lock();
                if lines >= 0 {
                    transcript.scroll_up(lines.unsigned_abs());
                } else {
                    transcript.scroll_down(lines.unsigned_abs());
                }
            }
        }
        Control::Continue
    }

    pub fn handle_event(&mut self, event: &Event) -> Control {
        if let Event::Paste(text) = event {
            self.paste(text);
            return Control::Continue;
        }
        let action = self.map_event(event);
        self.perform(action)
    }

    /// Pasted line breaks become spaces; the field is single-line.
    pub fn paste(&mut self, text: &str) {
        for c in text.chars() {
            match c {
                '\n' | '\r' | '\t' => self.input.insert(' '),
                c if c.is_control() => {}
                c => self.input.insert(c),
            }
        }
    }

    fn edit(&mut self, edit: Edit) {
        match edit {
            Edit::Insert(c) => self.input.insert(c),
            Edit::Backspace => self.input.backspace(),
            Edit::Delete => self.input.delete(),
            Edit::Left => self.input.move_left(),
            Edit::Right => self.input.move_right(),
            Edit::Home => self.input.move_home(),
            Edit::End => self.input.move_end(),
        }
    }

    pub fn abort_pending(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    #[cfg(test)]
    pub async fn wait_idle(&mut self) {
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
    }
}

fn map_key(key: &KeyEvent) -> Action {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => Action::Quit,
        KeyCode::Char('c') | KeyCode::Char('d') if ctrl => Action::Quit,
        KeyCode::Char('a') if ctrl => Action::Edit(Edit::Home),
        KeyCode::Char('e') if ctrl => Action::Edit(Edit::End),
        KeyCode::Char(c) if !ctrl => Action::Edit(Edit::Insert(c)),
        KeyCode::Enter => Action::Submit(Gesture::EnterKey),
        KeyCode::Backspace => Action::Edit(Edit::Backspace),
        KeyCode::Delete => Action::Edit(Edit::Delete),
        KeyCode::Left => Action::Edit(Edit::Left),
        KeyCode::Right => Action::Edit(Edit::Right),
        KeyCode::Home => Action::Edit(Edit::Home),
        KeyCode::End => Action::Edit(Edit::End),
        KeyCode::Up => Action::Scroll(1),
        KeyCode::Down => Action::Scroll(-1),
        KeyCode::PageUp => Action::Scroll(PAGE_STEP as isize),
        KeyCode::PageDown => Action::Scroll(-(PAGE_STEP as isize)),
        _ => Action::None,
    }
}

fn hit(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x &&
        column < rect.x.saturating_add(rect.width) &&
        row >= rect.y &&
        row < rect.y.saturating_add(rect.height)
}
