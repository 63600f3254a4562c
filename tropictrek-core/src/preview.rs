//! PDF preview modal: view an itinerary's text as structured blocks, or edit it.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PreviewBlock {
    Heading { level: usize, text: String },
    Bold(String),
    Bullet(String),
    Paragraph(String),
    Spacer,
}

/// Classify markdown-like text line by line. Runs of blank lines collapse into
/// one spacer; leading and trailing blanks are dropped.
pub fn classify(text: &str) -> Vec<PreviewBlock> {
    let mut blocks = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !blocks.is_empty() && blocks.last() != Some(&PreviewBlock::Spacer) {
                blocks.push(PreviewBlock::Spacer);
            }
            continue;
        }
        blocks.push(classify_line(trimmed));
    }

    if blocks.last() == Some(&PreviewBlock::Spacer) {
        blocks.pop();
    }
    blocks
}

fn classify_line(line: &str) -> PreviewBlock {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if (1..=6).contains(&hashes) && line[hashes..].starts_with(' ') {
        return PreviewBlock::Heading {
            level: hashes,
            text: line[hashes..].trim().to_string(),
        };
    }

    if line.len() > 4 && line.starts_with("**") && line.ends_with("**") {
        let inner = &line[2..line.len() - 2];
        if !inner.contains("**") {
            return PreviewBlock::Bold(inner.trim().to_string());
        }
    }

    for marker in ["- ", "* ", "• "] {
        if let Some(rest) = line.strip_prefix(marker) {
            return PreviewBlock::Bullet(rest.trim().to_string());
        }
    }

    PreviewBlock::Paragraph(line.to_string())
}

/// Multi-line text buffer with a cursor, used while editing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditBuffer {
    text: String,
    // Byte offset, always on a char boundary
    cursor: usize,
}

impl EditBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.len();
        Self { text, cursor }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Cursor as (line, column in chars), for drawing.
    pub fn cursor_position(&self) -> (usize, usize) {
        let before = &self.text[..self.cursor];
        let line = before.matches('\n').count();
        let column = before
            .rsplit('\n')
            .next()
            .map(|l| l.chars().count())
            .unwrap_or(0);
        (line, column)
    }

    pub fn insert_char(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    pub fn backspace(&mut self) {
        if let Some((idx, _)) = self.text[..self.cursor].char_indices().next_back() {
            self.text.remove(idx);
            self.cursor = idx;
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.len() {
            self.text.remove(self.cursor);
        }
    }

    pub fn move_left(&mut self) {
        if let Some((idx, _)) = self.text[..self.cursor].char_indices().next_back() {
            self.cursor = idx;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(c) = self.text[self.cursor..].chars().next() {
            self.cursor += c.len_utf8();
        }
    }

    pub fn move_line_start(&mut self) {
        self.cursor = self.text[..self.cursor].rfind('\n').map(|i| i + 1).unwrap_or(0);
    }

    pub fn move_line_end(&mut self) {
        self.cursor = self.text[self.cursor..]
            .find('\n')
            .map(|i| self.cursor + i)
            .unwrap_or(self.text.len());
    }
}

/// Committed edit handed to the owner of the modal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PdfEdit {
    pub pdf_id: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PreviewMode {
    Viewing,
    Editing(EditBuffer),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PdfPreview {
    pdf_id: String,
    label: String,
    saved_text: String,
    mode: PreviewMode,
}

impl PdfPreview {
    pub fn new(pdf_id: impl Into<String>, label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            pdf_id: pdf_id.into(),
            label: label.into(),
            saved_text: text.into(),
            mode: PreviewMode::Viewing,
        }
    }

    pub fn pdf_id(&self) -> &str {
        &self.pdf_id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn saved_text(&self) -> &str {
        &self.saved_text
    }

    pub fn mode(&self) -> &PreviewMode {
        &self.mode
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, PreviewMode::Editing(_))
    }

    /// Blocks for the viewing state.
    pub fn blocks(&self) -> Vec<PreviewBlock> {
        classify(&self.saved_text)
    }

    pub fn start_editing(&mut self) {
        if !self.is_editing() {
            self.mode = PreviewMode::Editing(EditBuffer::new(self.saved_text.clone()));
        }
    }

    pub fn buffer_mut(&mut self) -> Option<&mut EditBuffer> {
        match &mut self.mode {
            PreviewMode::Editing(buffer) => Some(buffer),
            PreviewMode::Viewing => None,
        }
    }

    pub fn can_save(&self) -> bool {
        match &self.mode {
            PreviewMode::Editing(buffer) => buffer.text() != self.saved_text,
            PreviewMode::Viewing => false,
        }
    }

    /// Commit the buffer and return to viewing. Returns the edit for the
    /// owner to act on, or `None` when there is nothing to save.
    pub fn save(&mut self) -> Option<PdfEdit> {
        if !self.can_save() {
            return None;
        }
        let PreviewMode::Editing(buffer) = std::mem::replace(&mut self.mode, PreviewMode::Viewing)
        else {
            return None;
        };
        self.saved_text = buffer.text;
        Some(PdfEdit {
            pdf_id: self.pdf_id.clone(),
            text: self.saved_text.clone(),
        })
    }

    pub fn cancel(&mut self) {
        self.mode = PreviewMode::Viewing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITINERARY: &str = "# Dominica Adventure\n\n\n**Day 1**\n- Trafalgar Falls\n* Boiling Lake\n• Emerald Pool\nArrive and relax.\n\n## Budget\n";

    #[test]
    fn test_classify_lines() {
        assert_eq!(
            classify(ITINERARY),
            vec![
                PreviewBlock::Heading { level: 1, text: "Dominica Adventure".to_string() },
                PreviewBlock::Spacer,
                PreviewBlock::Bold("Day 1".to_string()),
                PreviewBlock::Bullet("Trafalgar Falls".to_string()),
                PreviewBlock::Bullet("Boiling Lake".to_string()),
                PreviewBlock::Bullet("Emerald Pool".to_string()),
                PreviewBlock::Paragraph("Arrive and relax.".to_string()),
                PreviewBlock::Spacer,
                PreviewBlock::Heading { level: 2, text: "Budget".to_string() },
            ]
        );
    }

    #[test]
    fn test_hash_without_space_is_paragraph() {
        assert_eq!(classify("#hashtag"), vec![PreviewBlock::Paragraph("#hashtag".to_string())]);
        assert_eq!(
            classify("**a** and **b**"),
            vec![PreviewBlock::Paragraph("**a** and **b**".to_string())]
        );
    }

    #[test]
    fn test_edit_buffer_cursor_ops() {
        let mut buffer = EditBuffer::new("héllo");
        buffer.backspace();
        assert_eq!(buffer.text(), "héll");
        buffer.move_left();
        buffer.move_left();
        buffer.move_left();
        buffer.backspace();
        assert_eq!(buffer.text(), "éll");
        buffer.insert_newline();
        assert_eq!(buffer.cursor_position(), (1, 0));
        buffer.move_line_end();
        buffer.insert_char('!');
        assert_eq!(buffer.text(), "\néll!");
        buffer.move_line_start();
        buffer.delete();
        assert_eq!(buffer.text(), "\nll!");
        assert_eq!(buffer.cursor_position(), (1, 0));
    }

    #[test]
    fn test_save_only_when_changed() {
        let mut preview = PdfPreview::new("pdf-1", "Itinerary", "Day 1");
        assert!(!preview.can_save());
        preview.start_editing();
        assert!(!preview.can_save());
        assert_eq!(preview.save(), None);
        assert!(preview.is_editing());

        preview.buffer_mut().unwrap().insert_char('!');
        assert!(preview.can_save());
        let edit = preview.save().unwrap();
        assert_eq!(edit, PdfEdit { pdf_id: "pdf-1".to_string(), text: "Day 1!".to_string() });
        assert!(!preview.is_editing());
        assert_eq!(preview.saved_text(), "Day 1!");
    }

    #[test]
    fn test_cancel_reverts_text() {
        let mut preview = PdfPreview::new("pdf-1", "Itinerary", "Day 1");
        preview.start_editing();
        preview.buffer_mut().unwrap().insert_char('?');
        preview.cancel();
        assert!(!preview.is_editing());
        assert_eq!(preview.saved_text(), "Day 1");

        // Re-entering edit starts from the saved text, not the discarded buffer
        preview.start_editing();
        assert_eq!(preview.buffer_mut().unwrap().text(), "Day 1");
    }

    #[test]
    fn test_edit_back_to_original_cannot_save() {
        let mut preview = PdfPreview::new("pdf-1", "Itinerary", "ab");
        preview.start_editing();
        let buffer = preview.buffer_mut().unwrap();
        buffer.insert_char('c');
        buffer.backspace();
        assert!(!preview.can_save());
    }
}
