use chrono::{DateTime, Local};
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TurnId(pub u64);

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

/// A generated PDF reported by the backend for an assistant turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PdfAttachment {
    pdf_id: String,
}

impl PdfAttachment {
    /// Returns `None` for a blank id, so an attachment always has a usable id.
    pub fn new(pdf_id: impl Into<String>) -> Option<Self> {
        let pdf_id = pdf_id.into();
        if pdf_id.trim().is_empty() {
            None
        } else {
            Some(Self { pdf_id })
        }
    }

    pub fn pdf_id(&self) -> &str {
        &self.pdf_id
    }
}

/// One message in the conversation. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversationTurn {
    id: TurnId,
    content: String,
    sender: Sender,
    timestamp: DateTime<Local>,
    pdf: Option<PdfAttachment>,
}

impl ConversationTurn {
    pub fn user(id: TurnId, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            sender: Sender::User,
            timestamp: Local::now(),
            pdf: None,
        }
    }

    pub fn assistant(id: TurnId, content: impl Into<String>, pdf: Option<PdfAttachment>) -> Self {
        Self {
            id,
            content: content.into(),
            sender: Sender::Assistant,
            timestamp: Local::now(),
            pdf,
        }
    }

    pub fn id(&self) -> TurnId {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn pdf(&self) -> Option<&PdfAttachment> {
        self.pdf.as_ref()
    }

    pub fn pdf_id(&self) -> Option<&str> {
        self.pdf.as_ref().map(PdfAttachment::pdf_id)
    }

    pub fn pdf_generated(&self) -> bool {
        self.pdf.is_some()
    }

    /// Download and preview are offered only for turns carrying a PDF.
    pub fn offers_pdf_actions(&self) -> bool {
        self.sender == Sender::Assistant && self.pdf_generated()
    }
}

/// Opaque continuity token issued by the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionHandle(String);

impl SessionHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_pdf_id_is_no_attachment() {
        assert!(PdfAttachment::new("").is_none());
        assert!(PdfAttachment::new("   ").is_none());
        assert_eq!(PdfAttachment::new("pdf-1").unwrap().pdf_id(), "pdf-1");
    }

    #[test]
    fn test_pdf_actions_need_attachment() {
        let plain = ConversationTurn::assistant(TurnId(1), "Hello", None);
        assert!(!plain.pdf_generated());
        assert!(!plain.offers_pdf_actions());
        assert_eq!(plain.pdf_id(), None);

        let with_pdf = ConversationTurn::assistant(TurnId(2), "Ready", PdfAttachment::new("pdf-9"));
        assert!(with_pdf.pdf_generated());
        assert!(with_pdf.offers_pdf_actions());
        assert_eq!(with_pdf.pdf_id(), Some("pdf-9"));

        let user = ConversationTurn::user(TurnId(3), "Plan a trip");
        assert!(!user.offers_pdf_actions());
    }
}
