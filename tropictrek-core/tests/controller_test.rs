//! Integration tests for `ChatController` against an in-memory backend.

use api::{ChatReply, HealthStatus, NetworkError, TravelBackend};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tropictrek_core::{
    ChatController, ControllerEvent, ControllerOptions, FALLBACK_REPLY, InputError, Level,
    PROMPT_GALLERY, Sender,
};

// ============================================================================
// Test backend
// ============================================================================

#[derive(Default)]
struct MockBackend {
    replies: Mutex<VecDeque<Result<ChatReply, NetworkError>>>,
    requests: Mutex<Vec<(String, Option<String>)>>,
    healthy: bool,
    pdf: Option<Vec<u8>>,
    broken_images: Vec<String>,
}

impl MockBackend {
    fn with_replies(replies: Vec<Result<ChatReply, NetworkError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            healthy: true,
            ..Default::default()
        }
    }

    fn requests(&self) -> Vec<(String, Option<String>)> {
        self.requests.lock().unwrap().clone()
    }
}

fn server_error() -> NetworkError {
    NetworkError::Status {
        url: "http://localhost:8000/chat".to_string(),
        status: 500,
        body: "Internal server error".to_string(),
    }
}

#[async_trait]
impl TravelBackend for MockBackend {
    async fn send_message(
        &self,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<ChatReply, NetworkError> {
        self.requests
            .lock()
            .unwrap()
            .push((message.to_string(), session_id.map(str::to_string)));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(server_error()))
    }

    async fn download_pdf(&self, pdf_id: &str) -> Result<Bytes, NetworkError> {
        match &self.pdf {
            Some(bytes) => Ok(Bytes::from(bytes.clone())),
            None => Err(NetworkError::Status {
                url: format!("http://localhost:8000/download/{pdf_id}"),
                status: 404,
                body: "PDF not found".to_string(),
            }),
        }
    }

    async fn health_check(&self) -> Result<HealthStatus, NetworkError> {
        if self.healthy {
            Ok(serde_json::json!({"status": "healthy"}))
        } else {
            Err(server_error())
        }
    }

    async fn probe_image(&self, url: &str) -> Result<(), NetworkError> {
        if self.broken_images.iter().any(|u| u == url) {
            Err(NetworkError::Status {
                url: url.to_string(),
                status: 404,
                body: String::new(),
            })
        } else {
            Ok(())
        }
    }
}

fn reply(text: &str, session: &str) -> Result<ChatReply, NetworkError> {
    Ok(ChatReply {
        response: text.to_string(),
        session_id: session.to_string(),
        pdf_generated: false,
        pdf_id: None,
    })
}

fn pdf_reply(pdf_id: &str) -> Result<ChatReply, NetworkError> {
    Ok(ChatReply {
        response: "# Dominica Adventure\n**Day 1**\n- Trafalgar Falls\n\n📄 **PDF Generated:** `TropicTrek_Itinerary_Ana_Dominica.pdf`".to_string(),
        session_id: "session-1".to_string(),
        pdf_generated: true,
        pdf_id: Some(pdf_id.to_string()),
    })
}

fn options(download_dir: &Path) -> ControllerOptions {
    ControllerOptions {
        download_dir: download_dir.to_path_buf(),
        max_input_chars: 50,
        probe_images: false,
    }
}

fn make_controller(backend: &Arc<MockBackend>) -> ChatController {
    ChatController::new(backend.clone(), options(Path::new("/nonexistent")))
}

async fn send(controller: &mut ChatController, text: &str) -> ControllerEvent {
    controller.set_input(text).unwrap();
    controller.submit().expect("message should be sent");
    controller.next_event().await.expect("reply outcome")
}

// ============================================================================
// Sending
// ============================================================================

#[tokio::test]
async fn test_user_turn_first_and_input_cleared() {
    let backend = Arc::new(MockBackend::with_replies(vec![reply("Welcome!", "s-1")]));
    let mut controller = make_controller(&backend);

    controller.set_input("Plan a 3-day trip to Dominica").unwrap();
    let user_turn = controller.submit().unwrap();

    // Synchronous effects of submit
    assert_eq!(controller.input().value(), "");
    assert!(controller.is_loading());
    assert_eq!(controller.turns().len(), 1);
    assert_eq!(controller.turns()[0].id(), user_turn);
    assert_eq!(controller.turns()[0].sender(), Sender::User);

    let event = controller.next_event().await.unwrap();
    assert!(matches!(event, ControllerEvent::ReplyReceived { failed: false, .. }));
    assert!(!controller.is_loading());

    let turns = controller.turns();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].content(), "Plan a 3-day trip to Dominica");
    assert_eq!(turns[1].sender(), Sender::Assistant);
    assert_eq!(turns[1].content(), "Welcome!");
    assert!(turns[0].id() < turns[1].id());
}

#[tokio::test]
async fn test_session_captured_on_first_exchange() {
    let backend = Arc::new(MockBackend::with_replies(vec![
        reply("Dominica is lovely", "session-abc"),
        reply("Added hiking", "session-abc"),
        reply("Anything else?", "session-other"),
    ]));
    let mut controller = make_controller(&backend);

    send(&mut controller, "Plan a 3-day trip to Dominica").await;
    assert_eq!(
        backend.requests(),
        vec![("Plan a 3-day trip to Dominica".to_string(), None)]
    );
    assert_eq!(controller.session().map(|s| s.as_str()), Some("session-abc"));

    send(&mut controller, "Add a hiking day").await;
    send(&mut controller, "Thanks").await;

    let requests = backend.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[1].1.as_deref(), Some("session-abc"));
    assert_eq!(requests[2].1.as_deref(), Some("session-abc"));
    // A different id in a later reply does not replace the handle
    assert_eq!(controller.session().map(|s| s.as_str()), Some("session-abc"));
}

#[tokio::test]
async fn test_failed_send_appends_single_fallback_turn() {
    let backend = Arc::new(MockBackend::with_replies(vec![Err(server_error())]));
    let mut controller = make_controller(&backend);

    let event = send(&mut controller, "Hello").await;
    assert!(matches!(event, ControllerEvent::ReplyReceived { failed: true, .. }));

    assert!(!controller.is_loading());
    let assistant: Vec<_> = controller
        .turns()
        .iter()
        .filter(|t| t.sender() == Sender::Assistant)
        .collect();
    assert_eq!(assistant.len(), 1);
    assert_eq!(assistant[0].content(), FALLBACK_REPLY);
    assert!(!assistant[0].pdf_generated());
    assert!(controller.session().is_none());

    let note = controller.notifications().iter().last().unwrap();
    assert_eq!(note.level, Level::Error);

    // The conversation keeps working after a failure
    assert!(controller.set_input("Hello again").is_ok());
}

#[tokio::test]
async fn test_one_send_in_flight() {
    let backend = Arc::new(MockBackend::with_replies(vec![reply("Hi", "s")]));
    let mut controller = make_controller(&backend);

    controller.set_input("first").unwrap();
    controller.submit().unwrap();

    assert_eq!(controller.set_input("second"), Err(InputError::Disabled));
    assert_eq!(
        controller.edit_input(tui_input::InputRequest::InsertChar('x')),
        Err(InputError::Disabled)
    );
    assert_eq!(controller.submit(), None);

    controller.next_event().await.unwrap();
    assert_eq!(backend.requests().len(), 1);
    assert_eq!(controller.next_event().await, None);
}

#[tokio::test]
async fn test_blank_input_is_not_sent() {
    let backend = Arc::new(MockBackend::with_replies(vec![]));
    let mut controller = make_controller(&backend);

    controller.set_input("   ").unwrap();
    assert_eq!(controller.submit(), None);
    assert!(controller.turns().is_empty());
    assert_eq!(controller.pending(), 0);
}

#[tokio::test]
async fn test_input_limit_boundary() {
    let backend = Arc::new(MockBackend::with_replies(vec![reply("ok", "s")]));
    let mut controller = make_controller(&backend);

    let exact = "a".repeat(50);
    assert!(controller.set_input(&exact).is_ok());

    let over = "b".repeat(51);
    assert_eq!(controller.set_input(&over), Err(InputError::TooLong { max: 50 }));
    assert_eq!(controller.input().value(), exact);

    controller.submit().unwrap();
    controller.next_event().await.unwrap();
    assert_eq!(backend.requests(), vec![(exact, None)]);
}

#[tokio::test]
async fn test_prompt_selection_fills_input_without_sending() {
    let backend = Arc::new(MockBackend::with_replies(vec![]));
    let mut controller = ChatController::new(
        backend.clone(),
        ControllerOptions {
            max_input_chars: 1000,
            ..options(Path::new("/nonexistent"))
        },
    );

    assert!(controller.is_empty());
    assert_eq!(controller.select_prompt(0), Ok(true));
    assert_eq!(controller.input().value(), PROMPT_GALLERY[0].prompt);
    assert_eq!(controller.select_prompt(PROMPT_GALLERY.len()), Ok(false));

    assert!(controller.turns().is_empty());
    assert_eq!(controller.pending(), 0);
    assert!(backend.requests().is_empty());
}

// ============================================================================
// Health check
// ============================================================================

#[tokio::test]
async fn test_mount_reports_health() {
    let backend = Arc::new(MockBackend::with_replies(vec![]));
    let mut controller = make_controller(&backend);
    controller.mount();
    assert_eq!(
        controller.next_event().await,
        Some(ControllerEvent::HealthChecked { reachable: true })
    );
    assert_eq!(controller.notifications().iter().last().unwrap().level, Level::Success);

    let backend = Arc::new(MockBackend::default());
    let mut controller = make_controller(&backend);
    controller.mount();
    // Input stays usable while the check is outstanding
    assert!(controller.set_input("hello").is_ok());
    assert_eq!(
        controller.next_event().await,
        Some(ControllerEvent::HealthChecked { reachable: false })
    );
    assert_eq!(controller.notifications().iter().last().unwrap().level, Level::Warning);
}

// ============================================================================
// PDFs
// ============================================================================

#[tokio::test]
async fn test_pdf_reply_offers_actions() {
    let backend = Arc::new(MockBackend::with_replies(vec![
        pdf_reply("pdf-42"),
        Ok(ChatReply {
            response: "Something went sideways".to_string(),
            session_id: "session-1".to_string(),
            pdf_generated: true,
            pdf_id: Some(String::new()),
        }),
    ]));
    let mut controller = make_controller(&backend);

    send(&mut controller, "Make me an itinerary").await;
    let turn = controller.turns().last().unwrap();
    assert!(turn.offers_pdf_actions());
    assert_eq!(turn.pdf_id(), Some("pdf-42"));

    let record = controller.pdfs().get("pdf-42").unwrap();
    assert_eq!(record.label, "TropicTrek Itinerary Ana Dominica");
    assert_eq!(record.turn_id, turn.id());
    assert_eq!(controller.notifications().iter().last().unwrap().level, Level::Success);

    // pdf_generated without an id yields no affordance
    send(&mut controller, "Again").await;
    let turn = controller.turns().last().unwrap();
    assert!(!turn.pdf_generated());
    assert!(!turn.offers_pdf_actions());
    assert_eq!(controller.pdfs().len(), 1);
}

#[tokio::test]
async fn test_download_saves_file() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(MockBackend {
        pdf: Some(b"%PDF-1.4 trip".to_vec()),
        ..MockBackend::with_replies(vec![pdf_reply("pdf-42")])
    });
    let mut controller = ChatController::new(backend.clone(), options(dir.path()));

    send(&mut controller, "Make me an itinerary").await;
    assert!(controller.request_download("pdf-42"));

    let preparing = controller.notifications().iter().last().unwrap();
    assert_eq!(preparing.level, Level::Info);
    assert!(preparing.ttl.is_none());
    let preparing_id = preparing.id;

    let event = controller.next_event().await.unwrap();
    let expected = dir.path().join("TropicTrek_Itinerary_Ana_Dominica.pdf");
    assert_eq!(
        event,
        ControllerEvent::PdfSaved {
            pdf_id: "pdf-42".to_string(),
            path: expected.clone(),
        }
    );
    assert_eq!(std::fs::read(&expected).unwrap(), b"%PDF-1.4 trip");
    assert!(!controller.notifications().iter().any(|n| n.id == preparing_id));
    assert_eq!(controller.notifications().iter().last().unwrap().level, Level::Success);
}

#[tokio::test]
async fn test_download_failure_notifies() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(MockBackend::with_replies(vec![pdf_reply("pdf-42")]));
    let mut controller = ChatController::new(backend.clone(), options(dir.path()));

    send(&mut controller, "Make me an itinerary").await;
    controller.request_download("pdf-42");

    assert_eq!(
        controller.next_event().await,
        Some(ControllerEvent::DownloadFailed {
            pdf_id: "pdf-42".to_string()
        })
    );
    assert_eq!(controller.notifications().iter().last().unwrap().level, Level::Error);
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn test_download_unknown_pdf_is_refused() {
    let backend = Arc::new(MockBackend::with_replies(vec![]));
    let mut controller = make_controller(&backend);

    assert!(!controller.request_download("missing"));
    assert_eq!(controller.pending(), 0);
    assert_eq!(controller.notifications().iter().last().unwrap().level, Level::Warning);
}

#[tokio::test]
async fn test_preview_save_and_cancel() {
    let backend = Arc::new(MockBackend::with_replies(vec![pdf_reply("pdf-42")]));
    let mut controller = make_controller(&backend);
    send(&mut controller, "Make me an itinerary").await;

    assert!(!controller.open_preview("missing"));
    assert!(controller.open_preview("pdf-42"));
    let original = controller.preview().unwrap().saved_text().to_string();

    // Cancel: no edit, text reverts
    let preview = controller.preview_mut().unwrap();
    preview.start_editing();
    preview.buffer_mut().unwrap().insert_char('?');
    controller.cancel_preview_edit();
    assert_eq!(controller.save_preview(), None);
    assert_eq!(controller.preview().unwrap().saved_text(), original);

    // Save: edit carries exactly the edited text
    let preview = controller.preview_mut().unwrap();
    preview.start_editing();
    let buffer = preview.buffer_mut().unwrap();
    buffer.insert_newline();
    for c in "- Boiling Lake".chars() {
        buffer.insert_char(c);
    }
    let edited = format!("{original}\n- Boiling Lake");

    let edit = controller.save_preview().unwrap();
    assert_eq!(edit.pdf_id, "pdf-42");
    assert_eq!(edit.text, edited);
    assert_eq!(controller.pdfs().get("pdf-42").unwrap().current_text(), edited);

    // Reopening shows the saved edit; closing mid-edit drops the buffer
    controller.close_preview();
    assert!(controller.open_preview("pdf-42"));
    assert_eq!(controller.preview().unwrap().saved_text(), edited);
    controller.preview_mut().unwrap().start_editing();
    controller.close_preview();
    assert!(controller.preview().is_none());
    assert_eq!(controller.pdfs().get("pdf-42").unwrap().current_text(), edited);
}

// ============================================================================
// Images
// ============================================================================

#[tokio::test]
async fn test_broken_images_are_marked_individually() {
    let good = "https://images.unsplash.com/photo-good";
    let bad = "https://images.unsplash.com/photo-bad";
    let backend = Arc::new(MockBackend {
        broken_images: vec![bad.to_string()],
        ..MockBackend::with_replies(vec![reply(
            &format!("![Beach]({good})\n![Falls]({bad})\n![Beach again]({good})"),
            "s",
        )])
    });
    let mut controller = ChatController::new(
        backend.clone(),
        ControllerOptions {
            probe_images: true,
            ..options(Path::new("/nonexistent"))
        },
    );

    send(&mut controller, "Show me beaches").await;
    // Each distinct URL is probed once
    assert_eq!(controller.pending(), 2);
    while controller.next_event().await.is_some() {}

    assert!(!controller.image_failed(good));
    assert!(controller.image_failed(bad));
}
