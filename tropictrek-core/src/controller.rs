//! Root controller: the single owner of conversation state.
//!
//! Backend calls run as spawned tasks and report back over a channel. The
//! controller only mutates its state when the front end pulls outcomes with
//! [`ChatController::next_event`] or [`ChatController::try_next_event`], so
//! every change happens on the thread that owns the controller.

use api::{ChatReply, HealthStatus, NetworkError, TravelBackend};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tui_input::InputRequest;

use crate::error::{DownloadError, InputError};
use crate::input::InputBox;
use crate::notify::{Level, NotificationId, Notifications};
use crate::pdf::{PdfRegistry, save_pdf};
use crate::preview::{PdfEdit, PdfPreview};
use crate::prompts::PROMPT_GALLERY;
use crate::render::extract_images;
use crate::turn::{ConversationTurn, PdfAttachment, SessionHandle, TurnId};

/// Assistant turn appended when a message could not be delivered.
pub const FALLBACK_REPLY: &str =
    "Sorry, I'm having trouble connecting right now. Please try again in a moment.";

#[derive(Clone, Debug)]
pub struct ControllerOptions {
    pub download_dir: PathBuf,
    pub max_input_chars: usize,
    pub probe_images: bool,
}

enum Outcome {
    Health(Result<HealthStatus, NetworkError>),
    Reply(Result<ChatReply, NetworkError>),
    Download {
        pdf_id: String,
        notice: NotificationId,
        result: Result<PathBuf, DownloadError>,
    },
    ImageProbe {
        url: String,
        result: Result<(), NetworkError>,
    },
}

/// What changed after applying one backend outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControllerEvent {
    HealthChecked { reachable: bool },
    ReplyReceived { turn_id: TurnId, failed: bool },
    PdfSaved { pdf_id: String, path: PathBuf },
    DownloadFailed { pdf_id: String },
    ImageChecked { url: String, available: bool },
}

pub struct ChatController {
    backend: Arc<dyn TravelBackend>,
    options: ControllerOptions,
    turns: Vec<ConversationTurn>,
    next_turn_id: u64,
    session: Option<SessionHandle>,
    is_loading: bool,
    pdfs: PdfRegistry,
    probed_images: HashSet<String>,
    failed_images: HashSet<String>,
    notifications: Notifications,
    input: InputBox,
    preview: Option<PdfPreview>,
    outcome_tx: mpsc::UnboundedSender<Outcome>,
    outcome_rx: mpsc::UnboundedReceiver<Outcome>,
    pending: usize,
}

impl ChatController {
    pub fn new(backend: Arc<dyn TravelBackend>, options: ControllerOptions) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let input = InputBox::new(options.max_input_chars);

        Self {
            backend,
            options,
            turns: Vec::new(),
            next_turn_id: 1,
            session: None,
            is_loading: false,
            pdfs: PdfRegistry::new(),
            probed_images: HashSet::new(),
            failed_images: HashSet::new(),
            notifications: Notifications::new(),
            input,
            preview: None,
            outcome_tx,
            outcome_rx,
            pending: 0,
        }
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn session(&self) -> Option<&SessionHandle> {
        self.session.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn pdfs(&self) -> &PdfRegistry {
        &self.pdfs
    }

    pub fn image_failed(&self, url: &str) -> bool {
        self.failed_images.contains(url)
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut Notifications {
        &mut self.notifications
    }

    pub fn input(&self) -> &InputBox {
        &self.input
    }

    pub fn preview(&self) -> Option<&PdfPreview> {
        self.preview.as_ref()
    }

    pub fn preview_mut(&mut self) -> Option<&mut PdfPreview> {
        self.preview.as_mut()
    }

    /// Backend calls whose outcome has not been applied yet.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Check backend reachability once at startup. Does not block input.
    pub fn mount(&mut self) {
        let backend = Arc::clone(&self.backend);
        self.spawn(async move { Outcome::Health(backend.health_check().await) });
    }

    pub fn edit_input(&mut self, request: InputRequest) -> Result<bool, InputError> {
        if self.is_loading {
            return Err(InputError::Disabled);
        }
        self.input.handle(request)
    }

    pub fn set_input(&mut self, text: &str) -> Result<(), InputError> {
        if self.is_loading {
            return Err(InputError::Disabled);
        }
        self.input.set_value(text)
    }

    /// Put a gallery prompt into the input box without sending it.
    pub fn select_prompt(&mut self, index: usize) -> Result<bool, InputError> {
        match PROMPT_GALLERY.get(index) {
            Some(card) => self.set_input(card.prompt).map(|_| true),
            None => Ok(false),
        }
    }

    /// Send the input box content. Returns the id of the user turn, or
    /// `None` when nothing was sent (blank input or a reply still pending).
    pub fn submit(&mut self) -> Option<TurnId> {
        if self.is_loading || self.input.is_blank() {
            return None;
        }

        let text = self.input.value().trim().to_string();
        self.input.clear();
        let turn_id = self.push_turn(|id| ConversationTurn::user(id, text.clone()));
        self.is_loading = true;

        let backend = Arc::clone(&self.backend);
        let session = self.session.as_ref().map(|s| s.as_str().to_string());
        tracing::info!(turn = %turn_id, has_session = session.is_some(), "Sending message");
        self.spawn(async move {
            Outcome::Reply(backend.send_message(&text, session.as_deref()).await)
        });

        Some(turn_id)
    }

    /// Fetch a PDF and save it to the download directory.
    pub fn request_download(&mut self, pdf_id: &str) -> bool {
        let Some(record) = self.pdfs.get(pdf_id) else {
            tracing::warn!(pdf_id, "Download requested for unknown PDF");
            self.notifications
                .push(Level::Warning, "That itinerary is not available.");
            return false;
        };

        let file_name = record.file_name.clone();
        let notice = self
            .notifications
            .push_sticky(Level::Info, "Preparing your PDF download...");
        let backend = Arc::clone(&self.backend);
        let dir = self.options.download_dir.clone();
        let pdf_id = pdf_id.to_string();

        self.spawn(async move {
            let result = match backend.download_pdf(&pdf_id).await {
                Ok(bytes) => save_pdf(&dir, &file_name, &bytes).await,
                Err(e) => Err(e.into()),
            };
            Outcome::Download {
                pdf_id,
                notice,
                result,
            }
        });
        true
    }

    pub fn open_preview(&mut self, pdf_id: &str) -> bool {
        match self.pdfs.get(pdf_id) {
            Some(record) => {
                self.preview = Some(PdfPreview::new(
                    &record.pdf_id,
                    &record.label,
                    record.current_text(),
                ));
                true
            }
            None => false,
        }
    }

    /// Commit the preview's edit buffer. The edit is kept on the PDF record;
    /// the backend has no endpoint to receive it.
    pub fn save_preview(&mut self) -> Option<PdfEdit> {
        let edit = self.preview.as_mut()?.save()?;
        self.pdfs.apply_edit(&edit);
        tracing::info!(pdf_id = %edit.pdf_id, "Saved itinerary edits locally");
        self.notifications
            .push(Level::Success, "Itinerary changes saved.");
        Some(edit)
    }

    pub fn cancel_preview_edit(&mut self) {
        if let Some(preview) = self.preview.as_mut() {
            preview.cancel();
        }
    }

    /// Close the modal from either state, dropping uncommitted edits.
    pub fn close_preview(&mut self) {
        self.preview = None;
    }

    /// Wait for the next backend outcome and apply it. Returns `None` when no
    /// call is outstanding.
    pub async fn next_event(&mut self) -> Option<ControllerEvent> {
        if self.pending == 0 {
            return None;
        }
        let outcome = self.outcome_rx.recv().await?;
        self.pending -= 1;
        Some(self.apply(outcome))
    }

    pub fn try_next_event(&mut self) -> Option<ControllerEvent> {
        let outcome = self.outcome_rx.try_recv().ok()?;
        self.pending = self.pending.saturating_sub(1);
        Some(self.apply(outcome))
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Outcome> + Send + 'static,
    {
        self.pending += 1;
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(task.await);
        });
    }

    fn push_turn(&mut self, make: impl FnOnce(TurnId) -> ConversationTurn) -> TurnId {
        let id = TurnId(self.next_turn_id);
        self.next_turn_id += 1;
        self.turns.push(make(id));
        id
    }

    fn apply(&mut self, outcome: Outcome) -> ControllerEvent {
        match outcome {
            Outcome::Health(Ok(_)) => {
                tracing::info!("Backend is reachable");
                self.notifications
                    .push(Level::Success, "Connected to TropicTrek.");
                ControllerEvent::HealthChecked { reachable: true }
            }
            Outcome::Health(Err(e)) => {
                tracing::warn!("Health check failed: {}", e);
                self.notifications.push(
                    Level::Warning,
                    "TropicTrek backend is unreachable. Messages may fail until it is back.",
                );
                ControllerEvent::HealthChecked { reachable: false }
            }
            Outcome::Reply(Ok(reply)) => self.apply_reply(reply),
            Outcome::Reply(Err(e)) => {
                tracing::error!("Failed to send message: {}", e);
                self.is_loading = false;
                let turn_id =
                    self.push_turn(|id| ConversationTurn::assistant(id, FALLBACK_REPLY, None));
                self.notifications
                    .push(Level::Error, "Failed to send message. Please try again.");
                ControllerEvent::ReplyReceived {
                    turn_id,
                    failed: true,
                }
            }
            Outcome::Download {
                pdf_id,
                notice,
                result,
            } => {
                self.notifications.dismiss(notice);
                match result {
                    Ok(path) => {
                        tracing::info!(pdf_id = %pdf_id, "Saved PDF to {}", path.display());
                        self.notifications.push(
                            Level::Success,
                            format!("Itinerary saved to {}", path.display()),
                        );
                        ControllerEvent::PdfSaved { pdf_id, path }
                    }
                    Err(e) => {
                        tracing::error!(pdf_id = %pdf_id, "PDF download failed: {}", e);
                        self.notifications
                            .push(Level::Error, "Failed to download PDF. Please try again.");
                        ControllerEvent::DownloadFailed { pdf_id }
                    }
                }
            }
            Outcome::ImageProbe { url, result } => {
                let available = match result {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::debug!("Image {} failed to load: {}", url, e);
                        self.failed_images.insert(url.clone());
                        false
                    }
                };
                ControllerEvent::ImageChecked { url, available }
            }
        }
    }

    fn apply_reply(&mut self, reply: ChatReply) -> ControllerEvent {
        self.is_loading = false;

        match &self.session {
            None if !reply.session_id.is_empty() => {
                tracing::info!(session_id = %reply.session_id, "Session started");
                self.session = Some(SessionHandle::new(reply.session_id.clone()));
            }
            Some(current) if current.as_str() != reply.session_id => {
                tracing::warn!(
                    current = %current,
                    received = %reply.session_id,
                    "Backend returned a different session id; keeping the first"
                );
            }
            _ => {}
        }

        if reply.pdf_generated && reply.generated_pdf_id().is_none() {
            tracing::warn!("Reply reported a generated PDF without an id");
        }
        let pdf = reply.generated_pdf_id().and_then(PdfAttachment::new);
        let content = reply.response;
        let turn_id = self.push_turn(|id| ConversationTurn::assistant(id, content.clone(), pdf.clone()));

        if let Some(pdf) = pdf {
            let record = self.pdfs.insert(pdf.pdf_id(), turn_id, &content);
            tracing::info!(pdf_id = %record.pdf_id, label = %record.label, "Itinerary PDF generated");
            self.notifications
                .push(Level::Success, "Your itinerary PDF is ready to download!");
        }

        if self.options.probe_images {
            for image in extract_images(&content) {
                if !self.probed_images.insert(image.url.clone()) {
                    continue;
                }
                let backend = Arc::clone(&self.backend);
                self.spawn(async move {
                    let result = backend.probe_image(&image.url).await;
                    Outcome::ImageProbe {
                        url: image.url,
                        result,
                    }
                });
            }
        }

        ControllerEvent::ReplyReceived {
            turn_id,
            failed: false,
        }
    }
}
