use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Row, Table, Tabs, Wrap},
};
use finsight_core::chat::GREETING;
use finsight_core::upload::UPLOAD_SUCCEEDED;
use finsight_core::{ChatRole, EntryKind};
use crate::app::{App, BackendStatus, InputMode, Screen};
use crate::markdown::markdown_to_lines;

const ACCENT: Color = Color::Cyan;
const DIM: Color = Color::DarkGray;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, tabs, body, footer
    let [header_area, tabs_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_tabs(app, frame, tabs_area);

    match app.screen {
        Screen::Upload => render_upload_screen(app, frame, body_area),
        Screen::Chat => render_chat_screen(app, frame, body_area),
        Screen::Documents => render_documents_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);

    if app.picker.is_some() {
        render_picker(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let (dot, status_style) = match app.backend_status {
        BackendStatus::Online => ("●", Style::default().fg(Color::Green)),
        BackendStatus::Offline => ("●", Style::default().fg(Color::Red)),
        BackendStatus::Unknown => ("○", Style::default().fg(DIM)),
    };
    let backend = format!(" {} ", app.client.base_url());

    let [title_area, status_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(backend.chars().count() as u16 + 2),
    ])
    .areas(area);

    let title = Line::from(vec![
        Span::styled(" Financial Insights AI ", Style::default().fg(ACCENT).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(DIM),
        ),
    ]);
    frame.render_widget(Paragraph::new(title), title_area);

    let status = Line::from(vec![
        Span::styled(dot, status_style),
        Span::styled(backend, Style::default().fg(DIM)),
    ]);
    frame.render_widget(Paragraph::new(status), status_area);
}

fn render_tabs(app: &App, frame: &mut Frame, area: Rect) {
    let titles = Screen::ALL
        .iter()
        .map(|s| format!(" {} {} ", s.index() + 1, s.title()));

    let tabs = Tabs::new(titles)
        .select(app.screen.index())
        .style(Style::default().fg(DIM))
        .highlight_style(Style::default().fg(Color::Black).bg(ACCENT).bold())
        .divider("|");

    frame.render_widget(tabs, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = if app.picker.is_some() {
        " PICK "
    } else {
        match app.screen {
            Screen::Upload => " UPLOAD ",
            Screen::Chat if app.input_mode == InputMode::Editing => " ASK ",
            Screen::Chat => " CHAT ",
            Screen::Documents => " DOCS ",
        }
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(DIM).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let keys: &[(&str, &str)] = if app.picker.is_some() {
        &[("j/k", "nav"), ("Enter", "open/add"), ("h", "up"), ("Esc", "close")]
    } else {
        match (app.screen, app.input_mode) {
            (Screen::Upload, _) => &[
                ("o", "add PDFs"),
                ("d", "remove"),
                ("u", "upload"),
                ("m", "mode"),
                ("Tab", "screen"),
                ("q", "quit"),
            ],
            (Screen::Chat, InputMode::Normal) => &[
                ("i", "ask"),
                ("j/k", "scroll"),
                ("n", "new chat"),
                ("m", "mode"),
                ("Tab", "screen"),
                ("q", "quit"),
            ],
            (Screen::Chat, InputMode::Editing) => &[("Enter", "send"), ("Esc", "done")],
            (Screen::Documents, _) => &[
                ("j/k", "nav"),
                ("r", "refresh"),
                ("Tab", "screen"),
                ("q", "quit"),
            ],
        }
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    for (key, label) in keys {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_upload_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [pending_area, status_area, results_area] = Layout::vertical([
        Constraint::Percentage(40),
        Constraint::Length(5),
        Constraint::Min(0),
    ])
    .areas(area);

    // Pending files
    let pending_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .title(format!(
            " Pending PDFs ({}) - {} ",
            app.upload.pending.len(),
            app.upload.mode().display_name()
        ));

    let items: Vec<ListItem> = if app.upload.pending.is_empty() {
        vec![ListItem::new(Span::styled(
            "No files selected. Press 'o' to add PDFs.",
            Style::default().fg(DIM),
        ))]
    } else {
        app.upload
            .pending
            .files()
            .iter()
            .map(|f| {
                ListItem::new(Line::from(vec![
                    Span::raw(f.name.clone()),
                    Span::styled(format!("  {}", format_size(f.size)), Style::default().fg(DIM)),
                ]))
            })
            .collect()
    };

    let list = List::new(items)
        .block(pending_block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, pending_area, &mut app.pending_state);

    // Upload button and status
    let can_submit = app.upload.can_submit();
    let button_label = if app.upload.uploading { " Uploading... " } else { " Upload " };
    let button_style = if can_submit {
        Style::default().bg(Color::Blue).fg(Color::White).bold()
    } else {
        Style::default().bg(Color::Black).fg(DIM)
    };

    let mut lines = vec![Line::from(vec![
        Span::styled(button_label, button_style),
        Span::styled(
            format!("  {} total", format_size(app.upload.pending.total_size())),
            Style::default().fg(DIM),
        ),
    ])];

    if app.upload.uploading {
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Uploading{}", dots),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        )));
    } else if let Some(status) = &app.upload.status {
        let color = if status == UPLOAD_SUCCEEDED { Color::Green } else { Color::Red };
        lines.push(Line::from(Span::styled(status.clone(), Style::default().fg(color).bold())));
    }

    if let Some(notice) = &app.notice {
        lines.push(Line::from(Span::styled(notice.clone(), Style::default().fg(DIM))));
    }

    let status = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(" Status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status, status_area);

    // Per-file results
    let results_block = Block::default()
        .borders(Borders::ALL)
        .title(" Processing results ");

    if app.upload.results.is_empty() {
        let empty = Paragraph::new(Span::styled(
            "Results appear here after an upload.",
            Style::default().fg(DIM),
        ))
        .block(results_block);
        frame.render_widget(empty, results_area);
        return;
    }

    let header = Row::new(vec!["File", "Status", "Chunks", "Time"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    let rows = app.upload.results.iter().map(|r| {
        Row::new(vec![
            r.filename.clone(),
            r.message.clone(),
            r.chunks_count.to_string(),
            format!("{:.2}s", r.processing_time),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(35),
            Constraint::Percentage(45),
            Constraint::Length(8),
            Constraint::Length(9),
        ],
    )
    .header(header)
    .block(results_block);

    frame.render_widget(table, results_area);
}

fn assistant_label() -> Line<'static> {
    Line::from(Span::styled(
        "AI Assistant:",
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    ))
}

fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    if app.chat.transcript.is_empty() && !app.chat.is_sending() {
        lines.push(assistant_label());
        lines.push(Line::from(GREETING));
        return lines;
    }

    for msg in &app.chat.transcript {
        match msg.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
                )));
                for line in msg.content.lines() {
                    lines.push(Line::from(line.to_string()));
                }
            }
            ChatRole::Assistant => {
                lines.push(assistant_label());
                lines.extend(markdown_to_lines(&msg.content));
            }
        }
        lines.push(Line::default());
    }

    if app.chat.is_sending() {
        lines.push(assistant_label());
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Generating answer{}", dots),
            Style::default().fg(DIM).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [left_area, sources_area] = Layout::horizontal([
        Constraint::Percentage(70),
        Constraint::Percentage(30),
    ])
    .areas(area);

    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(left_area);

    // Store area for mouse hit-testing
    app.chat_area = Some(chat_area);

    // Measured without the block so the count is rows of wrapped text only
    let chat = Paragraph::new(Text::from(transcript_lines(app))).wrap(Wrap { trim: false });
    let inner_height = chat_area.height.saturating_sub(2);
    let total = chat.line_count(chat_area.width.saturating_sub(2));
    let max_scroll = u16::try_from(total)
        .unwrap_or(u16::MAX)
        .saturating_sub(inner_height);
    if app.chat_follow || app.chat_scroll >= max_scroll {
        app.chat_scroll = max_scroll;
        app.chat_follow = true;
    }

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .title(format!(" Chat - {} ", app.chat.mode().display_name()));

    let chat = chat.block(chat_block).scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    render_chat_input(app, frame, input_area);
    render_sources(app, frame, sources_area);
}

fn render_chat_input(app: &App, frame: &mut Frame, area: Rect) {
    let sending = app.chat.is_sending();
    let editing = app.input_mode == InputMode::Editing;

    let border_color = if sending {
        DIM
    } else if editing {
        Color::Yellow
    } else {
        Color::Gray
    };
    let title = if sending {
        " Sending... "
    } else if editing {
        " Ask (Enter to send) "
    } else {
        " Ask (i to type) "
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Calculate visible portion of input with horizontal scrolling
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.chat.cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if app.chat.input.is_empty() && !editing {
        Paragraph::new(Span::styled("Ask a question...", Style::default().fg(DIM)))
    } else {
        let visible_text: String = app
            .chat
            .input
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        Paragraph::new(visible_text).style(Style::default().fg(ACCENT))
    };

    frame.render_widget(input.block(input_block), area);

    if editing && !sending {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_sources(app: &App, frame: &mut Frame, area: Rect) {
    let title = match app.chat.last_processing_time {
        Some(secs) => format!(" Sources ({:.2}s) ", secs),
        None => " Sources ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(title);

    if app.chat.citations.is_empty() {
        let text = if app.chat.is_sending() {
            "Waiting for answer..."
        } else {
            "No sources yet"
        };
        let empty = Paragraph::new(Span::styled(text, Style::default().fg(DIM))).block(block);
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = app
        .chat
        .citations
        .iter()
        .map(|citation| {
            ListItem::new(Text::from(vec![
                Line::from(Span::styled(
                    citation.document_name().to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    format!("Page {}", citation.page),
                    Style::default().fg(DIM),
                )),
            ]))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

fn render_documents_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [status_area, table_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(area);

    if let Some(status) = &app.documents_status {
        frame.render_widget(
            Paragraph::new(Span::styled(format!(" {}", status), Style::default().fg(DIM))),
            status_area,
        );
    }

    let header = Row::new(vec!["Filename", "Uploaded", "Chunks", "Status"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    let rows = app.documents.iter().map(|d| {
        Row::new(vec![
            d.filename.clone(),
            format_timestamp(&d.upload_date),
            d.chunks_count.to_string(),
            d.status.clone(),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(45),
            Constraint::Length(20),
            Constraint::Length(8),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(ACCENT))
            .title(match app.chunks_total {
                Some(chunks) => format!(
                    " Indexed documents ({}) - {} chunks ",
                    app.documents.len(),
                    chunks
                ),
                None => format!(" Indexed documents ({}) ", app.documents.len()),
            }),
    )
    .highlight_style(
        Style::default()
            .bg(Color::Blue)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

    frame.render_stateful_widget(table, table_area, &mut app.documents_state);
}

fn render_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let Some(picker) = app.picker.as_mut() else {
        return;
    };

    // Calculate popup size and position (centered)
    let popup_width = (area.width * 7 / 10).max(40).min(area.width.saturating_sub(4));
    let popup_height = (area.height * 7 / 10).max(8).min(area.height.saturating_sub(2));
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .title(format!(" Add PDF: {} ", picker.dir.display()));
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let [list_area, hint_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(inner);

    let items: Vec<ListItem> = picker
        .entries
        .iter()
        .map(|entry| match entry.kind {
            EntryKind::Parent => ListItem::new(" ../").style(Style::default().fg(DIM)),
            EntryKind::Dir => {
                ListItem::new(format!(" {}/", entry.name)).style(Style::default().fg(Color::Blue))
            }
            EntryKind::Pdf => ListItem::new(format!(" {}", entry.name)),
        })
        .collect();

    let list = List::new(items)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">");
    frame.render_stateful_widget(list, list_area, &mut picker.state);

    let hint = match &picker.error {
        Some(error) => Span::styled(error.clone(), Style::default().fg(Color::Red)),
        None => Span::styled(
            "Only folders and PDF files are shown",
            Style::default().fg(DIM),
        ),
    };
    frame.render_widget(Paragraph::new(hint), hint_area);
}

fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// `2024-03-01T10:15:00.123456` → `2024-03-01 10:15:00`
fn format_timestamp(raw: &str) -> String {
    raw.replacen('T', " ", 1).chars().take(19).collect()
}
