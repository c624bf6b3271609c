use chrono::{ DateTime, Local };
use ratatui::layout::{ Alignment, Constraint, Layout };
use ratatui::style::{ Color, Modifier, Style };
use ratatui::text::{ Line, Span };
use ratatui::widgets::{ Block, Borders, Paragraph };
use ratatui::Frame;
use super::app::{ App, Regions };
use crate::models::chat::{ ChatMessage, Role };

const SEND_LABEL: &str = "Send";

pub fn draw(frame: &mut Frame, app: &mut App) {
    let [chat_box, input_row, status] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(3),
        Constraint::Length(1),
    ]).areas(frame.area());
    let [user_input, send_btn] = Layout::horizontal([
        Constraint::Min(10),
        Constraint::Length(10),
    ]).areas(input_row);
    app.regions = Regions { chat_box, user_input, send_btn };

    // chat-box
    let block = Block::default().title(" chat ").borders(Borders::ALL);
    let inner = block.inner(chat_box);
    let shared = app.transcript().clone();
    let mut transcript = shared.lock();
    let lines = transcript_lines(transcript.entries(), inner.width as usize);
    let max_back = lines.len().saturating_sub(inner.height as usize);
    transcript.clamp_scroll(max_back);
    let top = max_back - transcript.scroll_back();
    drop(transcript);
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .scroll((top.min(u16::MAX as usize) as u16, 0)),
        chat_box
    );

    // user-input
    let block = Block::default().title(" message ").borders(Borders::ALL);
    let inner = block.inner(user_input);
    // Terminal columns, not chars: wide glyphs take two cells.
    let column = str_width(app.input.before_cursor());
    let offset = column.saturating_sub((inner.width as usize).saturating_sub(1));
    frame.render_widget(
        Paragraph::new(app.input.value().to_string())
            .block(block)
            .scroll((0, offset.min(u16::MAX as usize) as u16)),
        user_input
    );
    if inner.width > 0 && inner.height > 0 {
        let x = (column - offset).min(inner.width.saturating_sub(1) as usize) as u16;
        frame.set_cursor_position((inner.x + x, inner.y));
    }

    // send-btn
    frame.render_widget(
        Paragraph::new(SEND_LABEL)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD))
            .block(Block::default().borders(Borders::ALL)),
        send_btn
    );

    frame.render_widget(
        Paragraph::new(status_line(app)).style(Style::default().fg(Color::DarkGray)),
        status
    );
}

fn status_line(app: &App) -> String {
    let controller = app.controller();
    let conversation = controller
        .chat_id()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "new".to_string());
    let waiting = match controller.in_flight() {
        0 => String::new(),
        n => format!(" | waiting for {} answer{}", n, if n == 1 { "" } else { "s" }),
    };
    format!(
        " conversation: {}{} | Enter/Send: send  PgUp/PgDn: scroll  Esc: quit",
        conversation,
        waiting
    )
}

fn role_style(role: Role) -> (&'static str, Style) {
    match role {
        Role::User => ("you", Style::default().fg(Color::Cyan)),
        Role::Assistant => ("assistant", Style::default().fg(Color::Green)),
        Role::Error => ("error", Style::default().fg(Color::Red)),
    }
}

pub fn transcript_lines(entries: &[ChatMessage], width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (i, message) in entries.iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        let (label, style) = role_style(message.role);
        let time = DateTime::from_timestamp(message.timestamp, 0)
            .map(|t| t.with_timezone(&Local).format("%H:%M").to_string())
            .unwrap_or_default();
        lines.push(
            Line::from(
                vec![
                    Span::styled(label, style.add_modifier(Modifier::BOLD)),
                    Span::styled(format!(" {}", time), Style::default().fg(Color::DarkGray))
                ]
            )
        );
        for row in wrap(&message.content, width) {
            let row_style = if message.role == Role::Error { style } else { Style::default() };
            lines.push(Line::styled(row, row_style));
        }
    }
    lines
}

fn str_width(text: &str) -> usize {
    Span::raw(text).width()
}

fn char_width(c: char) -> usize {
    str_width(c.encode_utf8(&mut [0; 4]))
}

/// Greedy word wrap by display width; words wider than `width` are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for raw in text.split('\n') {
        let mut line = String::new();
        let mut len = 0;
        for word in raw.split(' ') {
            let word_len = str_width(word);
            if len > 0 && len + 1 + word_len > width {
                out.push(std::mem::take(&mut line));
                len = 0;
            } else if len > 0 {
                line.push(' ');
                len += 1;
            }
            for c in word.chars() {
                let c_len = char_width(c);
                if len > 0 && len + c_len > width {
                    out.push(std::mem::take(&mut line));
                    len = 0;
                }
                line.push(c);
                len += c_len;
            }
        }
        out.push(line);
    }
    out
}
