use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::collections::{HashMap, VecDeque};
use std::time::Instant;
use tropictrek_core::{
    ChatController, Command, ControllerEvent, InputError, PROMPT_GALLERY, RenderedTurn, Sender,
    TurnId, render_turn,
};
use tui_input::backend::crossterm::to_input_request;

/// Older entries are dropped once this many messages have been sent.
const MAX_RECALL: usize = 100;

/// Sent messages and commands, recalled with Up/Down.
struct RecallBuffer {
    sent: VecDeque<String>,
    /// Index into `sent` while browsing
    cursor: Option<usize>,
    /// What was in the box when browsing started
    stash: String,
}

impl RecallBuffer {
    fn new() -> Self {
        Self {
            sent: VecDeque::with_capacity(MAX_RECALL),
            cursor: None,
            stash: String::new(),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.sent.len()
    }

    /// Remember a sent line. Blank lines and immediate repeats are skipped.
    fn record(&mut self, line: &str) {
        let line = line.trim();
        if !line.is_empty() && self.sent.back().map(String::as_str) != Some(line) {
            if self.sent.len() == MAX_RECALL {
                self.sent.pop_front();
            }
            self.sent.push_back(line.to_string());
        }
        self.stop_browsing();
    }

    /// Step back to an older line. `typed` is stashed on the first step.
    fn older(&mut self, typed: &str) -> Option<&str> {
        let cursor = match self.cursor {
            None if !self.sent.is_empty() => {
                self.stash = typed.to_string();
                self.sent.len() - 1
            }
            Some(i) if i > 0 => i - 1,
            _ => return None,
        };
        self.cursor = Some(cursor);
        self.sent.get(cursor).map(String::as_str)
    }

    /// Step forward; past the newest line the stashed text comes back.
    fn newer(&mut self) -> Option<&str> {
        let i = self.cursor?;
        if i + 1 < self.sent.len() {
            self.cursor = Some(i + 1);
            self.sent.get(i + 1).map(String::as_str)
        } else {
            self.cursor = None;
            Some(&self.stash)
        }
    }

    /// Typing ends browsing.
    fn stop_browsing(&mut self) {
        self.cursor = None;
        self.stash.clear();
    }
}

pub struct App {
    pub controller: ChatController,
    pub status_message: Option<String>,
    pub show_help: bool,
    pub thinking_frame: usize,
    /// 0 follows the newest turn; higher values scroll up from the bottom
    pub scroll_offset: usize,
    pub preview_scroll: u16,
    pub gallery_index: Option<usize>,
    recall: RecallBuffer,
    rendered: HashMap<TurnId, RenderedTurn>,
    seen_turns: usize,
    should_quit: bool,
}

impl App {
    pub fn new(controller: ChatController) -> Self {
        Self {
            controller,
            status_message: None,
            show_help: false,
            thinking_frame: 0,
            scroll_offset: 0,
            preview_scroll: 0,
            gallery_index: None,
            recall: RecallBuffer::new(),
            rendered: HashMap::new(),
            seen_turns: 0,
            should_quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn rendered(&self, id: TurnId) -> Option<&RenderedTurn> {
        self.rendered.get(&id)
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    pub fn thinking_indicator(&self) -> &'static str {
        const BRAILLE_FRAMES: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];
        BRAILLE_FRAMES[self.thinking_frame % BRAILLE_FRAMES.len()]
    }

    pub fn advance_thinking_animation(&mut self) {
        self.thinking_frame = self.thinking_frame.wrapping_add(1);
    }

    /// Apply finished backend calls and expire old notifications.
    pub fn check_controller_events(&mut self) {
        while let Some(event) = self.controller.try_next_event() {
            match event {
                ControllerEvent::ReplyReceived { turn_id, failed } => {
                    tracing::debug!(turn = %turn_id, failed, "Reply applied");
                }
                ControllerEvent::PdfSaved { path, .. } => {
                    tracing::debug!("PDF written to {}", path.display());
                }
                ControllerEvent::HealthChecked { .. }
                | ControllerEvent::DownloadFailed { .. }
                | ControllerEvent::ImageChecked { .. } => {}
            }
        }
        self.sync_turns();
        self.controller.notifications_mut().prune(Instant::now());
    }

    /// Render new turns once and jump to the bottom when one was appended.
    fn sync_turns(&mut self) {
        let turns = self.controller.turns();
        if turns.len() == self.seen_turns {
            return;
        }
        for turn in &turns[self.seen_turns..] {
            if turn.sender() == Sender::Assistant {
                self.rendered.insert(turn.id(), render_turn(turn.content()));
            }
        }
        self.seen_turns = turns.len();
        self.scroll_offset = 0;
    }

    /// Handle a key event
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if let (KeyCode::Char('c') | KeyCode::Char('d'), KeyModifiers::CONTROL) =
            (key.code, key.modifiers)
        {
            self.should_quit = true;
            return;
        }

        if self.show_help {
            self.show_help = false;
            return;
        }

        if self.controller.preview().is_some() {
            self.handle_preview_key(key);
            return;
        }

        match key.code {
            KeyCode::Tab => self.next_prompt(),
            KeyCode::Up => {
                let current = self.controller.input().value().to_string();
                if let Some(prev) = self.recall.older(&current).map(str::to_string) {
                    self.set_input(&prev);
                }
            }
            KeyCode::Down => {
                if let Some(next) = self.recall.newer().map(str::to_string) {
                    self.set_input(&next);
                }
            }
            KeyCode::PageUp => self.scroll_up(10),
            KeyCode::PageDown => self.scroll_down(10),
            KeyCode::Esc => self.status_message = None,
            KeyCode::Enter => self.handle_enter(),
            _ => {
                self.recall.stop_browsing();
                if let Some(request) = to_input_request(&Event::Key(key)) {
                    if let Err(e) = self.controller.edit_input(request) {
                        self.report_input_error(e);
                    }
                }
            }
        }
    }

    fn handle_preview_key(&mut self, key: KeyEvent) {
        let editing = self
            .controller
            .preview()
            .map(|p| p.is_editing())
            .unwrap_or(false);

        if editing {
            match (key.code, key.modifiers) {
                (KeyCode::Char('s'), KeyModifiers::CONTROL) => {
                    if self.controller.save_preview().is_none() {
                        self.status_message = Some("No changes to save".to_string());
                    }
                }
                (KeyCode::Char('w'), KeyModifiers::CONTROL) => self.close_preview(),
                (KeyCode::Esc, _) => self.controller.cancel_preview_edit(),
                (code, _) => {
                    let Some(buffer) = self
                        .controller
                        .preview_mut()
                        .and_then(|p| p.buffer_mut())
                    else {
                        return;
                    };
                    match code {
                        KeyCode::Enter => buffer.insert_newline(),
                        KeyCode::Backspace => buffer.backspace(),
                        KeyCode::Delete => buffer.delete(),
                        KeyCode::Left => buffer.move_left(),
                        KeyCode::Right => buffer.move_right(),
                        KeyCode::Home => buffer.move_line_start(),
                        KeyCode::End => buffer.move_line_end(),
                        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                            buffer.insert_char(c)
                        }
                        _ => {}
                    }
                }
            }
            return;
        }

        match key.code {
            KeyCode::Char('e') => {
                if let Some(preview) = self.controller.preview_mut() {
                    preview.start_editing();
                }
            }
            KeyCode::Char('d') => {
                if let Some(pdf_id) = self.controller.preview().map(|p| p.pdf_id().to_string()) {
                    self.controller.request_download(&pdf_id);
                }
            }
            KeyCode::Up => self.preview_scroll = self.preview_scroll.saturating_sub(1),
            KeyCode::Down => self.preview_scroll = self.preview_scroll.saturating_add(1),
            KeyCode::Esc | KeyCode::Char('q') => self.close_preview(),
            _ => {}
        }
    }

    fn close_preview(&mut self) {
        self.controller.close_preview();
        self.preview_scroll = 0;
    }

    /// Cycle the gallery prompts into the input box while the chat is empty.
    fn next_prompt(&mut self) {
        if !self.controller.is_empty() {
            return;
        }
        let index = self
            .gallery_index
            .map(|i| (i + 1) % PROMPT_GALLERY.len())
            .unwrap_or(0);
        match self.controller.select_prompt(index) {
            Ok(true) => self.gallery_index = Some(index),
            Ok(false) => {}
            Err(e) => self.report_input_error(e),
        }
    }

    fn handle_enter(&mut self) {
        let text = self.controller.input().value().trim().to_string();
        if text.is_empty() {
            return;
        }
        self.status_message = None;

        if Command::is_command(&text) {
            self.recall.record(&text);
            if self.controller.set_input("").is_ok() {
                self.handle_command(&text);
            }
            return;
        }

        if self.controller.submit().is_some() {
            self.recall.record(&text);
            self.gallery_index = None;
            self.thinking_frame = 0;
            self.sync_turns();
        }
    }

    fn handle_command(&mut self, input: &str) {
        let command = match Command::parse(input) {
            Ok(command) => command,
            Err(e) => {
                self.status_message = Some(format!("Error: {}", e));
                return;
            }
        };

        match command {
            Command::Help => self.show_help = true,
            Command::Quit => self.should_quit = true,
            Command::ListPdfs => {
                let pdfs = self.controller.pdfs();
                self.status_message = Some(if pdfs.is_empty() {
                    "No itineraries yet".to_string()
                } else {
                    pdfs.iter()
                        .enumerate()
                        .map(|(i, r)| format!("{}. {}", i + 1, r.label))
                        .collect::<Vec<_>>()
                        .join("  ")
                });
            }
            Command::Download(number) => match self.pdf_id(number) {
                Some(pdf_id) => {
                    self.controller.request_download(&pdf_id);
                }
                None => self.status_message = Some("No such itinerary".to_string()),
            },
            Command::Preview(number) => match self.pdf_id(number) {
                Some(pdf_id) => {
                    self.controller.open_preview(&pdf_id);
                    self.preview_scroll = 0;
                }
                None => self.status_message = Some("No such itinerary".to_string()),
            },
        }
    }

    fn pdf_id(&self, number: Option<usize>) -> Option<String> {
        self.controller
            .pdfs()
            .by_number(number)
            .map(|r| r.pdf_id.clone())
    }

    fn set_input(&mut self, text: &str) {
        if let Err(e) = self.controller.set_input(text) {
            self.report_input_error(e);
        }
    }

    fn report_input_error(&mut self, error: InputError) {
        match error {
            // Typing while a reply is pending is expected; the status bar
            // already shows the loading indicator
            InputError::Disabled => {}
            InputError::TooLong { .. } => self.status_message = Some(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recall_restores_typed_text() {
        let mut recall = RecallBuffer::new();
        recall.record("first");
        recall.record("second");
        recall.record("  second ");

        assert_eq!(recall.len(), 2);
        assert_eq!(recall.older("draft"), Some("second"));
        assert_eq!(recall.older("ignored"), Some("first"));
        assert_eq!(recall.older("ignored"), None);
        assert_eq!(recall.newer(), Some("second"));
        assert_eq!(recall.newer(), Some("draft"));
        assert_eq!(recall.newer(), None);
    }

    #[test]
    fn test_recall_empty() {
        let mut recall = RecallBuffer::new();
        recall.record("   ");
        assert_eq!(recall.len(), 0);
        assert_eq!(recall.older("text"), None);
        assert_eq!(recall.newer(), None);
    }

    #[test]
    fn test_recall_drops_oldest_past_cap() {
        let mut recall = RecallBuffer::new();
        for i in 0..MAX_RECALL + 5 {
            recall.record(&format!("message {i}"));
        }
        assert_eq!(recall.len(), MAX_RECALL);

        let mut oldest = None;
        while let Some(line) = recall.older("") {
            oldest = Some(line.to_string());
        }
        assert_eq!(oldest.as_deref(), Some("message 5"));
    }

    #[test]
    fn test_typing_ends_browsing() {
        let mut recall = RecallBuffer::new();
        recall.record("Grenada beaches");
        assert_eq!(recall.older("half typed"), Some("Grenada beaches"));
        recall.stop_browsing();
        assert_eq!(recall.newer(), None);
        assert_eq!(recall.older("new draft"), Some("Grenada beaches"));
        assert_eq!(recall.newer(), Some("new draft"));
    }
}
