use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, FocusPane, InputMode};
use crate::chat::{ChatMessage, ChatRole};

/// Turn one line of assistant/user text into styled spans: `**bold**`
/// becomes bold, `[text](url)` becomes a highlighted link. Text without
/// markers passes through untouched.
pub fn format_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.char_indices().peekable();
    let mut current_text = String::new();

    while let Some((_, c)) = chars.next() {
        if c == '*' && chars.peek().map(|(_, c)| *c) == Some('*') {
            // Consume the second *
            chars.next();

            // Push any accumulated plain text
            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;

            while let Some((_, c)) = chars.next() {
                if c == '*' && chars.peek().map(|(_, c)| *c) == Some('*') {
                    chars.next(); // consume second *
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else if c == '[' {
            // Try [text](url); anything short of the full shape is literal
            let mut label = String::new();
            let mut url = String::new();
            let mut stage = 0; // 0 = in label, 1 = expect '(', 2 = in url
            let mut complete = false;
            let mut consumed = String::new();

            while let Some((_, c)) = chars.next() {
                consumed.push(c);
                match stage {
                    0 => {
                        if c == ']' {
                            stage = 1;
                        } else {
                            label.push(c);
                        }
                    }
                    1 => {
                        if c == '(' {
                            stage = 2;
                        } else {
                            break;
                        }
                    }
                    _ => {
                        if c == ')' {
                            complete = true;
                            break;
                        }
                        url.push(c);
                    }
                }
                if complete {
                    break;
                }
            }

            if complete && !label.is_empty() {
                if !current_text.is_empty() {
                    spans.push(Span::raw(std::mem::take(&mut current_text)));
                }
                spans.push(Span::styled(
                    label,
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::UNDERLINED),
                ));
                spans.push(Span::styled(
                    format!(" ({})", url),
                    Style::default().fg(Color::DarkGray),
                ));
            } else {
                current_text.push('[');
                current_text.push_str(&consumed);
            }
        } else {
            current_text.push(c);
        }
    }

    // Push any remaining text
    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

/// Lay out the transcript as styled lines. Both roles run through
/// `format_line`; the thinking placeholder is appended last and is never
/// part of the transcript itself.
fn transcript_lines(messages: &[ChatMessage], pending: bool, animation_frame: u8) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = Vec::new();

    for msg in messages {
        let label = match msg.role {
            ChatRole::User => Span::styled(
                "You:",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            ChatRole::Assistant => Span::styled(
                "AI:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        };
        lines.push(Line::from(label));
        for line in msg.content.lines() {
            lines.push(format_line(line));
        }
        lines.push(Line::default());
    }

    if pending {
        lines.push(Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    let [blocks_area, chat_area] = Layout::horizontal([
        Constraint::Percentage(40),
        Constraint::Percentage(60),
    ])
    .areas(body_area);

    render_blocks_pane(app, frame, blocks_area);
    render_chat_pane(app, frame, chat_area);

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let header = Line::from(vec![
        Span::styled(
            " PowerUp Chat ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("({} blocks active) ", app.selector.active_count()),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            app.client.base_url().to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

fn render_blocks_pane(app: &mut App, frame: &mut Frame, area: Rect) {
    let [filter_area, list_area] =
        Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(area);

    let blocks_focused = app.focus == FocusPane::Blocks;
    let filter_editing = blocks_focused && app.input_mode == InputMode::Editing;

    // Filter input
    let filter_border_color = if filter_editing {
        Color::Yellow
    } else {
        Color::DarkGray
    };
    let filter_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(filter_border_color))
        .title(" Search blocks (/) ");
    let filter = Paragraph::new(app.selector.filter().to_string())
        .style(Style::default().fg(Color::Cyan))
        .block(filter_block);
    frame.render_widget(filter, filter_area);

    // Blocks list
    let list_border_color = if blocks_focused { Color::Cyan } else { Color::DarkGray };
    let list_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(list_border_color))
        .title(" Blocks (Enter to toggle) ");

    let visible = app.selector.visible();
    let items: Vec<ListItem> = visible
        .iter()
        .map(|cap| {
            let active = app.selector.is_active(cap.id);
            let marker = if active { "[x] " } else { "[ ] " };
            let name_style = if active {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(marker, name_style),
                    Span::styled(cap.display_name, name_style),
                ]),
                Line::from(Span::styled(
                    format!("    {}", cap.description),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(list_block)
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    frame.render_stateful_widget(list, list_area, &mut app.blocks_state);
}

fn render_chat_pane(app: &mut App, frame: &mut Frame, area: Rect) {
    let [history_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(area);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = history_area.height.saturating_sub(2);
    app.chat_width = history_area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");

    let chat_text = if app.chat.messages().is_empty() && !app.chat.is_pending() {
        Text::from(Span::styled(
            "Pick some blocks and ask me anything...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Text::from(transcript_lines(
            app.chat.messages(),
            app.chat.is_pending(),
            app.animation_frame,
        ))
    };

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, history_area);

    // Message input - highlight when focused
    let input_focused = app.focus == FocusPane::Input;
    let input_border_color = if input_focused { Color::Yellow } else { Color::DarkGray };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border_color))
        .title(" Message (Tab to focus) ");

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let cursor_pos = app.message_cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .message_input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, input_area);

    if input_focused {
        let cursor_x = input_area.x + 1 + (cursor_pos - scroll_offset) as u16;
        let cursor_y = input_area.y + 1;
        frame.set_cursor_position((cursor_x, cursor_y));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let hint = match (app.focus, app.input_mode) {
        (FocusPane::Blocks, InputMode::Normal) => {
            " j/k: move  Enter: toggle  /: filter  Tab: message  q: quit "
        }
        (FocusPane::Blocks, InputMode::Editing) => {
            " type to filter  Enter: done  Esc: clear  Tab: message "
        }
        (FocusPane::Input, _) => " Enter: send  Esc/Tab: back to blocks ",
    };
    let footer = Paragraph::new(Span::styled(hint, Style::default().fg(Color::DarkGray)));
    frame.render_widget(footer, area);
}
