//! Core of the TropicTrek chat client
//!
//! This crate is UI-agnostic and provides:
//! - **Model**: `ConversationTurn`, `SessionHandle`, `PdfRegistry`
//! - **Rendering**: `render_turn` splits assistant text into image, PDF-link,
//!   video and text blocks with keyword emphasis
//! - **Preview**: `PdfPreview`, the view/edit state machine for itinerary text
//! - **Controller**: `ChatController`, the single owner of conversation state
//!
//! # Example
//!
//! ```ignore
//! let mut controller = ChatController::new(Arc::new(api_client), options);
//! controller.mount();
//! controller.set_input("Plan a 3-day trip to Dominica")?;
//! controller.submit();
//! while let Some(event) = controller.next_event().await { /* redraw */ }
//! ```
pub mod command;
pub mod controller;
pub mod emphasis;
pub mod error;
pub mod input;
pub mod notify;
pub mod pdf;
pub mod preview;
pub mod prompts;
pub mod render;
pub mod turn;

pub use command::{Command, HELP_TEXT};
pub use controller::{ChatController, ControllerEvent, ControllerOptions, FALLBACK_REPLY};
pub use emphasis::{Span, SpanStyle};
pub use error::{CommandError, DownloadError, InputError};
pub use input::InputBox;
pub use notify::{Level, Notification, Notifications};
pub use pdf::{PdfRecord, PdfRegistry};
pub use preview::{EditBuffer, PdfEdit, PdfPreview, PreviewBlock, PreviewMode};
pub use prompts::{PROMPT_GALLERY, PromptCard};
pub use render::{DisplayBlock, ImageEntry, PdfLink, RenderedTurn, TextLine, VideoEmbed, render_turn};
pub use turn::{ConversationTurn, PdfAttachment, Sender, SessionHandle, TurnId};
