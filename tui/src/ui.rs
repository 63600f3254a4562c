use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
};
use std::time::Instant;
use tropictrek_core::{
    ConversationTurn, DisplayBlock, HELP_TEXT, Level, PROMPT_GALLERY, PdfPreview, PreviewBlock,
    PreviewMode, Sender, SpanStyle, TextLine, emphasis::emphasize,
};

use crate::app::App;

const ASSISTANT_NAME: &str = "TropicTrek";

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Chat area
            Constraint::Length(3), // Input area
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    render_chat(f, app, chunks[0]);
    render_input(f, app, chunks[1]);
    render_status(f, app, chunks[2]);

    if let Some(preview) = app.controller.preview() {
        render_preview(f, preview, app.preview_scroll);
    } else if app.show_help {
        render_help(f);
    } else {
        // Set cursor position in input box
        let input = app.controller.input().input();
        f.set_cursor_position((
            chunks[1].x + input.visual_cursor() as u16 + 1,
            chunks[1].y + 1,
        ));
    }
}

fn render_chat(f: &mut Frame, app: &mut App, area: Rect) {
    let all_lines = if app.controller.is_empty() {
        gallery_lines(app.gallery_index)
    } else {
        chat_lines(app)
    };

    // scroll_offset=0 means auto-scroll to bottom, higher values scroll up from bottom
    let inner_width = area.width.saturating_sub(3).max(1) as usize; // borders and scrollbar
    let total_lines: usize = all_lines
        .iter()
        .map(|line| line.width().max(1).div_ceil(inner_width))
        .sum();
    let visible_height = area.height.saturating_sub(2) as usize;
    let max_scroll = total_lines.saturating_sub(visible_height);

    if app.scroll_offset > max_scroll {
        app.scroll_offset = max_scroll;
    }
    let effective_scroll = max_scroll.saturating_sub(app.scroll_offset);

    let chat_content = Paragraph::new(all_lines)
        .block(Block::default().borders(Borders::ALL).title("TropicTrek"))
        .wrap(Wrap { trim: false })
        .scroll((effective_scroll as u16, 0));

    f.render_widget(chat_content, area);

    if total_lines > visible_height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("▲"))
            .end_symbol(Some("▼"));

        // ScrollbarState position is from top, so we use effective_scroll
        let mut scrollbar_state = ScrollbarState::new(max_scroll).position(effective_scroll);

        let scrollbar_area = area.inner(Margin {
            vertical: 1,
            horizontal: 0,
        });
        f.render_stateful_widget(scrollbar, scrollbar_area, &mut scrollbar_state);
    }
}

fn gallery_lines(selected: Option<usize>) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            "Welcome to TropicTrek!",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from("Your guide to the islands of the Eastern Caribbean. Try one of these:"),
        Line::from(""),
    ];

    for (i, card) in PROMPT_GALLERY.iter().enumerate() {
        let style = if selected == Some(i) {
            Style::default().bg(Color::Blue).fg(Color::White)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {} ", card.title), style.add_modifier(Modifier::BOLD)),
            Span::styled(format!("- {}", card.prompt), style),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Tab picks a prompt, Enter sends it. /help lists commands.",
        Style::default().fg(Color::DarkGray),
    )));
    lines
}

fn chat_lines(app: &App) -> Vec<Line<'static>> {
    let mut all_lines: Vec<Line> = Vec::new();

    for turn in app.controller.turns() {
        let (role, style) = match turn.sender() {
            Sender::User => ("You", Style::default().fg(Color::Cyan)),
            Sender::Assistant => (ASSISTANT_NAME, Style::default().fg(Color::Green)),
        };

        all_lines.push(Line::from(vec![
            Span::styled(format!("[{}]", role), style.add_modifier(Modifier::BOLD)),
            Span::styled(
                format!(" {}", turn.timestamp().format("%H:%M")),
                Style::default().fg(Color::DarkGray),
            ),
        ]));

        match turn.sender() {
            Sender::User => {
                for line in turn.content().lines() {
                    all_lines.push(Line::from(line.to_string()));
                }
            }
            Sender::Assistant => assistant_lines(app, turn, &mut all_lines),
        }

        // Add blank line between messages
        all_lines.push(Line::from(""));
    }

    if app.controller.is_loading() {
        all_lines.push(Line::from(vec![
            Span::styled(
                format!("[{}] ", ASSISTANT_NAME),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("{} Planning your trip...", app.thinking_indicator()),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }

    all_lines
}

fn assistant_lines(app: &App, turn: &ConversationTurn, all_lines: &mut Vec<Line<'static>>) {
    let Some(rendered) = app.rendered(turn.id()) else {
        all_lines.extend(turn.content().lines().map(|l| Line::from(l.to_string())));
        return;
    };

    for block in &rendered.blocks {
        match block {
            DisplayBlock::Images(images) => {
                for image in images {
                    let failed = app.controller.image_failed(&image.url);
                    let label = image.display_label(failed);
                    let line = if failed {
                        Line::from(Span::styled(
                            format!("[{}]", label),
                            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                        ))
                    } else {
                        Line::from(vec![
                            Span::styled(
                                format!("[Image: {}] ", label),
                                Style::default().fg(Color::Magenta).add_modifier(Modifier::ITALIC),
                            ),
                            Span::styled(image.url.clone(), Style::default().fg(Color::DarkGray)),
                        ])
                    };
                    all_lines.push(line);
                }
            }
            DisplayBlock::PdfLink(link) => {
                all_lines.push(Line::from(vec![
                    Span::styled(
                        format!("[PDF: {}] ", link.label),
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(link.url.clone(), Style::default().fg(Color::DarkGray)),
                ]));
            }
            DisplayBlock::Video(video) => {
                all_lines.push(Line::from(vec![
                    Span::styled(
                        "[Video] ",
                        Style::default().fg(Color::Blue).add_modifier(Modifier::ITALIC),
                    ),
                    Span::styled(video.embed_url(), Style::default().fg(Color::DarkGray)),
                ]));
            }
            DisplayBlock::Text(TextLine::Blank) => all_lines.push(Line::from("")),
            DisplayBlock::Text(TextLine::Text(spans)) => {
                all_lines.push(Line::from(
                    spans.iter().map(styled_span).collect::<Vec<_>>(),
                ));
            }
        }
    }

    if let Some(pdf_id) = turn.pdf_id().filter(|_| turn.offers_pdf_actions()) {
        let number = app.controller.pdfs().number_of(pdf_id).unwrap_or(0);
        all_lines.push(Line::from(vec![
            Span::styled(
                "Your itinerary PDF is ready! ",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("/download {}  /preview {}", number, number),
                Style::default().fg(Color::Cyan),
            ),
        ]));
    }
}

fn styled_span(span: &tropictrek_core::Span) -> Span<'static> {
    let style = match span.style {
        SpanStyle::Plain => Style::default(),
        SpanStyle::Strong => Style::default().add_modifier(Modifier::BOLD),
        SpanStyle::Keyword => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    };
    Span::styled(span.text.clone(), style)
}

fn render_input(f: &mut Frame, app: &App, area: Rect) {
    let input = app.controller.input();
    let title = if app.controller.is_loading() {
        "Waiting for TropicTrek...".to_string()
    } else {
        format!(
            "Message ({}/{}, / for commands)",
            input.char_count(),
            input.max_chars()
        )
    };
    let fg = if app.controller.is_loading() {
        Color::DarkGray
    } else {
        Color::White
    };

    let input_widget = Paragraph::new(input.value().to_string())
        .style(Style::default().fg(fg))
        .block(Block::default().borders(Borders::ALL).title(title));

    f.render_widget(input_widget, area);
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let session = app
        .controller
        .session()
        .map(|s| format!(" | session {}", s.as_str().chars().take(8).collect::<String>()))
        .unwrap_or_default();

    let (status_text, style) = if let Some(note) = app.controller.notifications().current(Instant::now()) {
        let bg = match note.level {
            Level::Info => Color::Blue,
            Level::Success => Color::Green,
            Level::Warning => Color::Yellow,
            Level::Error => Color::Red,
        };
        (
            format!(" {}{} ", note.message, session),
            Style::default().bg(bg).fg(Color::Black),
        )
    } else if let Some(ref msg) = app.status_message {
        (
            format!(" {}{} ", msg, session),
            Style::default().bg(Color::DarkGray).fg(Color::White),
        )
    } else if app.controller.is_loading() {
        (
            format!(" {} Thinking...{} ", app.thinking_indicator(), session),
            Style::default().bg(Color::DarkGray).fg(Color::White),
        )
    } else {
        (
            format!(
                " {} messages | {} itineraries{} ",
                app.controller.turns().len(),
                app.controller.pdfs().len(),
                session
            ),
            Style::default().bg(Color::DarkGray).fg(Color::White),
        )
    };

    f.render_widget(Paragraph::new(status_text).style(style), area);
}

fn render_preview(f: &mut Frame, preview: &PdfPreview, scroll: u16) {
    let area = centered_rect(80, 80, f.area());
    f.render_widget(Clear, area);

    let hints = match preview.mode() {
        PreviewMode::Viewing => " e edit | d download | Esc close ",
        PreviewMode::Editing(_) => " Ctrl+S save | Esc cancel | Ctrl+W close ",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Preview: {} ", preview.label()))
        .title_bottom(hints)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);

    match preview.mode() {
        PreviewMode::Viewing => {
            let lines: Vec<Line> = preview.blocks().iter().map(preview_line).collect();
            let paragraph = Paragraph::new(lines)
                .block(block)
                .wrap(Wrap { trim: false })
                .scroll((scroll, 0));
            f.render_widget(paragraph, area);
        }
        PreviewMode::Editing(buffer) => {
            let (line, column) = buffer.cursor_position();
            // Keep the cursor line in view
            let top = line.saturating_sub(inner.height.saturating_sub(1) as usize);
            let paragraph = Paragraph::new(buffer.text().to_string())
                .block(block)
                .scroll((top as u16, 0));
            f.render_widget(paragraph, area);
            f.set_cursor_position((
                inner.x + (column as u16).min(inner.width.saturating_sub(1)),
                inner.y + (line - top) as u16,
            ));
        }
    }
}

fn preview_line(block: &PreviewBlock) -> Line<'static> {
    match block {
        PreviewBlock::Heading { level, text } => {
            let style = if *level == 1 {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            };
            Line::from(Span::styled(text.clone(), style))
        }
        PreviewBlock::Bold(text) => Line::from(Span::styled(
            text.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        PreviewBlock::Bullet(text) => {
            let mut spans = vec![Span::styled("  • ", Style::default().fg(Color::Cyan))];
            spans.extend(emphasize(text).iter().map(styled_span));
            Line::from(spans)
        }
        PreviewBlock::Paragraph(text) => {
            Line::from(emphasize(text).iter().map(styled_span).collect::<Vec<_>>())
        }
        PreviewBlock::Spacer => Line::from(""),
    }
}

fn render_help(f: &mut Frame) {
    let area = centered_rect(60, 50, f.area());
    f.render_widget(Clear, area);

    let mut lines: Vec<Line> = HELP_TEXT.lines().map(|l| Line::from(l.to_string())).collect();
    lines.push(Line::from(""));
    lines.push(Line::from("Keys: Tab prompt gallery | Up/Down history | PgUp/PgDn scroll | Ctrl+C quit"));

    let help = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(" Help (any key to close) "));
    f.render_widget(help, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
