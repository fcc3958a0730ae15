//! Full-screen terminal window: chat history on top, a small form below.

use std::{
    io::{self, Write},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::{Attribute, Print, SetAttribute},
    terminal::{self, ClearType},
};
use tokio::runtime::Handle;

use tgb_core::{bridge::Bridge, history::HistoryEntry};

/// Incoming messages show up within this interval even without input.
const REDRAW_INTERVAL: Duration = Duration::from_millis(200);
const HISTORY_KEEP: usize = 500;
/// Rows below the history list: separator, three fields, buttons.
const FORM_ROWS: u16 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Message,
    Caption,
    FilePath,
    SendButton,
    ImageButton,
    FileButton,
}

const FOCUS_ORDER: [Focus; 6] = [
    Focus::Message,
    Focus::Caption,
    Focus::FilePath,
    Focus::SendButton,
    Focus::ImageButton,
    Focus::FileButton,
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormAction {
    SendText(String),
    SendImage(Option<String>),
    SendFile(PathBuf, Option<String>),
    Quit,
}

/// Editable state of the window form, independent of the terminal.
#[derive(Clone, Debug)]
pub struct Form {
    pub message: String,
    pub caption: String,
    pub file_path: String,
    pub focus: Focus,
}

impl Default for Form {
    fn default() -> Self {
        Self {
            message: String::new(),
            caption: String::new(),
            file_path: String::new(),
            focus: Focus::Message,
        }
    }
}

impl Form {
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<FormAction> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => Some(FormAction::Quit),
            KeyCode::Char('c') if ctrl => Some(FormAction::Quit),
            KeyCode::Tab => {
                self.move_focus(1);
                None
            }
            KeyCode::BackTab => {
                self.move_focus(FOCUS_ORDER.len() - 1);
                None
            }
            KeyCode::Enter => self.activate(),
            KeyCode::Backspace => {
                if let Some(field) = self.focused_field() {
                    field.pop();
                }
                None
            }
            KeyCode::Char(c) if !ctrl => {
                if let Some(field) = self.focused_field() {
                    field.push(c);
                }
                None
            }
            _ => None,
        }
    }

    fn move_focus(&mut self, step: usize) {
        let idx = FOCUS_ORDER
            .iter()
            .position(|f| *f == self.focus)
            .unwrap_or(0);
        self.focus = FOCUS_ORDER[(idx + step) % FOCUS_ORDER.len()];
    }

    fn focused_field(&mut self) -> Option<&mut String> {
        match self.focus {
            Focus::Message => Some(&mut self.message),
            Focus::Caption => Some(&mut self.caption),
            Focus::FilePath => Some(&mut self.file_path),
            Focus::SendButton | Focus::ImageButton | Focus::FileButton => None,
        }
    }

    fn take_caption(&mut self) -> Option<String> {
        let caption = std::mem::take(&mut self.caption);
        let caption = caption.trim();
        (!caption.is_empty()).then(|| caption.to_string())
    }

    fn activate(&mut self) -> Option<FormAction> {
        match self.focus {
            Focus::Message | Focus::SendButton => {
                if self.message.trim().is_empty() {
                    return None;
                }
                Some(FormAction::SendText(std::mem::take(&mut self.message)))
            }
            Focus::Caption | Focus::ImageButton => Some(FormAction::SendImage(self.take_caption())),
            Focus::FilePath | Focus::FileButton => {
                let path = self.file_path.trim().to_string();
                if path.is_empty() {
                    return None;
                }
                self.file_path.clear();
                Some(FormAction::SendFile(PathBuf::from(path), self.take_caption()))
            }
        }
    }
}

/// Fit the newest history entries into `rows` lines of `width` columns, oldest first.
pub fn history_lines(entries: &[HistoryEntry], width: usize, rows: usize) -> Vec<String> {
    let start = entries.len().saturating_sub(rows);
    entries[start..]
        .iter()
        .map(|e| {
            let line = format!("[{}] {}", e.at.format("%H:%M"), e).replace('\n', " ");
            truncate_to_width(&line, width)
        })
        .collect()
}

fn truncate_to_width(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    if width <= 3 {
        return s.chars().take(width).collect();
    }
    let mut out: String = s.chars().take(width - 3).collect();
    out.push_str("...");
    out
}

/// Show the tail of a field that does not fit.
fn field_view(value: &str, width: usize) -> String {
    let count = value.chars().count();
    if count <= width {
        return value.to_string();
    }
    value.chars().skip(count - width).collect()
}

fn render(
    out: &mut impl Write,
    form: &Form,
    entries: &[HistoryEntry],
    (cols, rows): (u16, u16),
) -> io::Result<()> {
    let width = cols as usize;
    let list_rows = rows.saturating_sub(FORM_ROWS + 1) as usize;

    queue!(
        out,
        terminal::Clear(ClearType::All),
        cursor::MoveTo(0, 0),
        SetAttribute(Attribute::Bold),
        Print(truncate_to_width("Chat History", width)),
        SetAttribute(Attribute::Reset)
    )?;

    for (i, line) in history_lines(entries, width, list_rows).iter().enumerate() {
        queue!(out, cursor::MoveTo(0, 1 + i as u16), Print(line))?;
    }

    let top = rows.saturating_sub(FORM_ROWS);
    queue!(
        out,
        cursor::MoveTo(0, top),
        Print("─".repeat(width))
    )?;

    let label_width = 10;
    let value_width = width.saturating_sub(label_width + 1);
    let fields = [
        (Focus::Message, "Message:", form.message.as_str(), "Type a message..."),
        (Focus::Caption, "Caption:", form.caption.as_str(), "Image caption (optional)"),
        (Focus::FilePath, "File:", form.file_path.as_str(), "Path of a file to send"),
    ];
    for (i, (focus, label, value, placeholder)) in fields.iter().enumerate() {
        let shown = if value.is_empty() && form.focus != *focus {
            placeholder.to_string()
        } else {
            field_view(value, value_width)
        };
        queue!(
            out,
            cursor::MoveTo(0, top + 1 + i as u16),
            Print(format!("{label:<label_width$} "))
        )?;
        if form.focus == *focus {
            queue!(
                out,
                SetAttribute(Attribute::Reverse),
                Print(format!("{shown:<value_width$}")),
                SetAttribute(Attribute::Reset)
            )?;
        } else {
            queue!(
                out,
                SetAttribute(Attribute::Dim),
                Print(shown),
                SetAttribute(Attribute::Reset)
            )?;
        }
    }

    queue!(out, cursor::MoveTo(0, top + 4))?;
    let buttons = [
        (Focus::SendButton, "[ Send ]"),
        (Focus::ImageButton, "[ Send Image ]"),
        (Focus::FileButton, "[ Send File ]"),
    ];
    for (focus, label) in buttons {
        if form.focus == focus {
            queue!(
                out,
                SetAttribute(Attribute::Reverse),
                Print(label),
                SetAttribute(Attribute::Reset),
                Print("  ")
            )?;
        } else {
            queue!(out, Print(label), Print("  "))?;
        }
    }
    queue!(
        out,
        SetAttribute(Attribute::Dim),
        Print("Tab: next  Enter: send  Esc: quit"),
        SetAttribute(Attribute::Reset)
    )?;

    out.flush()
}

/// Raw mode + alternate screen for as long as the guard lives.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

/// Leave raw mode and the alternate screen. Safe to call more than once.
pub fn restore_terminal() {
    let _ = execute!(io::stdout(), cursor::Show, terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
}

fn dispatch(handle: &Handle, bridge: &Arc<Bridge>, action: FormAction) {
    let bridge = bridge.clone();
    handle.spawn(async move {
        let outcome = match action {
            FormAction::SendText(text) => bridge.send_text(&text).await,
            FormAction::SendImage(caption) => bridge.send_clipboard_image(caption.as_deref()).await,
            FormAction::SendFile(path, caption) => {
                bridge.send_file(&path, caption.as_deref()).await
            }
            FormAction::Quit => return,
        };
        tracing::debug!(?outcome, "window action finished");
    });
}

/// Run the window event loop on the calling (blocking) thread until the user quits.
///
/// Sends run on `handle` so the window keeps redrawing while they are in flight.
pub fn run(bridge: Arc<Bridge>, handle: Handle) -> anyhow::Result<()> {
    let _guard = TerminalGuard::enter()?;
    let mut form = Form::default();
    let mut out = io::stdout();

    loop {
        let entries = bridge.history().tail(HISTORY_KEEP);
        render(&mut out, &form, &entries, terminal::size()?)?;

        if !event::poll(REDRAW_INTERVAL)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            match form.handle_key(key) {
                Some(FormAction::Quit) => break,
                Some(action) => dispatch(&handle, &bridge, action),
                None => {}
            }
        }
    }

    tracing::info!("Window closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Local;
    use tgb_core::history::EntryKind;

    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(form: &mut Form, s: &str) {
        for c in s.chars() {
            assert_eq!(form.handle_key(press(KeyCode::Char(c))), None);
        }
    }

    #[test]
    fn enter_in_message_field_sends_and_clears() {
        let mut form = Form::default();
        type_str(&mut form, "hello");
        assert_eq!(
            form.handle_key(press(KeyCode::Enter)),
            Some(FormAction::SendText("hello".to_string()))
        );
        assert!(form.message.is_empty());
        assert_eq!(form.handle_key(press(KeyCode::Enter)), None);
    }

    #[test]
    fn tab_cycles_focus_through_fields_and_buttons() {
        let mut form = Form::default();
        let mut seen = vec![form.focus];
        for _ in 0..6 {
            form.handle_key(press(KeyCode::Tab));
            seen.push(form.focus);
        }
        assert_eq!(&seen[..6], &FOCUS_ORDER);
        assert_eq!(seen[6], Focus::Message);

        form.handle_key(press(KeyCode::BackTab));
        assert_eq!(form.focus, Focus::FileButton);
    }

    #[test]
    fn image_button_takes_the_caption() {
        let mut form = Form::default();
        form.handle_key(press(KeyCode::Tab));
        type_str(&mut form, "cat pic");
        form.focus = Focus::ImageButton;
        assert_eq!(
            form.handle_key(press(KeyCode::Enter)),
            Some(FormAction::SendImage(Some("cat pic".to_string())))
        );
        assert!(form.caption.is_empty());

        assert_eq!(
            form.handle_key(press(KeyCode::Enter)),
            Some(FormAction::SendImage(None))
        );
    }

    #[test]
    fn file_button_needs_a_path() {
        let mut form = Form {
            focus: Focus::FileButton,
            ..Form::default()
        };
        assert_eq!(form.handle_key(press(KeyCode::Enter)), None);

        form.focus = Focus::FilePath;
        type_str(&mut form, "/tmp/report.pdf");
        form.handle_key(press(KeyCode::Backspace));
        type_str(&mut form, "f");
        assert_eq!(
            form.handle_key(press(KeyCode::Enter)),
            Some(FormAction::SendFile(PathBuf::from("/tmp/report.pdf"), None))
        );
        assert!(form.file_path.is_empty());
    }

    #[test]
    fn typing_on_a_button_does_nothing() {
        let mut form = Form {
            focus: Focus::SendButton,
            ..Form::default()
        };
        type_str(&mut form, "x");
        assert!(form.message.is_empty());
    }

    #[test]
    fn esc_and_ctrl_c_quit() {
        let mut form = Form::default();
        assert_eq!(form.handle_key(press(KeyCode::Esc)), Some(FormAction::Quit));
        assert_eq!(
            form.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(FormAction::Quit)
        );
        assert!(form.message.is_empty());
    }

    #[test]
    fn history_lines_keep_the_newest_entries_and_fit_the_width() {
        let entries: Vec<HistoryEntry> = (0..5)
            .map(|i| HistoryEntry {
                at: Local::now(),
                kind: EntryKind::Incoming {
                    author: "alice".to_string(),
                },
                text: format!("message number {i}"),
            })
            .collect();

        let lines = history_lines(&entries, 80, 2);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("alice: message number 3"));
        assert!(lines[1].ends_with("alice: message number 4"));

        let narrow = history_lines(&entries, 12, 1);
        assert_eq!(narrow[0].chars().count(), 12);
        assert!(narrow[0].ends_with("..."));
    }

    #[test]
    fn render_draws_title_fields_and_buttons() {
        let form = Form {
            message: "draft".to_string(),
            ..Form::default()
        };
        let mut buf = Vec::new();
        render(&mut buf, &form, &[], (80, 24)).unwrap();
        let screen = String::from_utf8_lossy(&buf);

        assert!(screen.contains("Chat History"));
        assert!(screen.contains("draft"));
        assert!(screen.contains("Image caption (optional)"));
        assert!(screen.contains("[ Send Image ]"));
        assert!(screen.contains("[ Send File ]"));
    }
}
