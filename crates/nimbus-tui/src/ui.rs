use nimbus_core::{ChatMessage, WeatherCategory, WeatherInsights};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, BackendStatus, InputMode};

/// Colours derived from the current weather category and theme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Palette {
    bg: Color,
    fg: Color,
    muted: Color,
    accent: Color,
    user: Color,
}

fn palette(category: WeatherCategory, dark: bool) -> Palette {
    let (bg, accent) = match (category, dark) {
        (WeatherCategory::Clear, true) => (Color::Rgb(41, 32, 20), Color::Rgb(251, 191, 36)),
        (WeatherCategory::Clear, false) => (Color::Rgb(255, 247, 237), Color::Rgb(217, 119, 6)),
        (WeatherCategory::Rain, true) => (Color::Rgb(15, 23, 42), Color::Rgb(96, 165, 250)),
        (WeatherCategory::Rain, false) => (Color::Rgb(224, 231, 255), Color::Rgb(49, 46, 129)),
        (WeatherCategory::Cloudy, true) => (Color::Rgb(31, 41, 55), Color::Rgb(156, 163, 175)),
        (WeatherCategory::Cloudy, false) => (Color::Rgb(229, 231, 235), Color::Rgb(75, 85, 99)),
        (WeatherCategory::Smoke, true) => (Color::Rgb(39, 39, 42), Color::Rgb(148, 163, 184)),
        (WeatherCategory::Smoke, false) => (Color::Rgb(203, 213, 225), Color::Rgb(71, 85, 105)),
        (WeatherCategory::Snow, true) => (Color::Rgb(30, 41, 59), Color::Rgb(224, 242, 254)),
        (WeatherCategory::Snow, false) => (Color::Rgb(248, 250, 252), Color::Rgb(14, 116, 144)),
        (WeatherCategory::Default, true) => (Color::Rgb(17, 24, 39), Color::Rgb(56, 189, 248)),
        (WeatherCategory::Default, false) => (Color::Rgb(240, 249, 255), Color::Rgb(37, 99, 235)),
    };

    if dark {
        Palette {
            bg,
            fg: Color::Rgb(241, 245, 249),
            muted: Color::Rgb(148, 163, 184),
            accent,
            user: Color::Rgb(147, 197, 253),
        }
    } else {
        Palette {
            bg,
            fg: Color::Rgb(31, 41, 55),
            muted: Color::Rgb(100, 116, 139),
            accent,
            user: Color::Rgb(37, 99, 235),
        }
    }
}

fn category_icon(category: WeatherCategory) -> &'static str {
    match category {
        WeatherCategory::Clear => "☀",
        WeatherCategory::Rain => "🌧",
        WeatherCategory::Cloudy => "☁",
        WeatherCategory::Smoke => "🌫",
        WeatherCategory::Snow => "❄",
        WeatherCategory::Default => "🌤",
    }
}

/// Small animated strip shown in the header for precipitation
fn ambient_strip(category: WeatherCategory, frame: u8) -> &'static str {
    const RAIN: [&str; 3] = ["╲ ╲ ╲ ╲", " ╲ ╲ ╲ ", "╲  ╲ ╲ "];
    const SNOW: [&str; 3] = ["* · * ·", "· * · *", " * · * "];
    let idx = usize::from(frame) % 3;
    match category {
        WeatherCategory::Rain => RAIN[idx],
        WeatherCategory::Snow => SNOW[idx],
        _ => "",
    }
}

/// Word-wrap `text` to `width` columns, keeping explicit line breaks.
/// Words longer than a line are split.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();

            while word.len() > width {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(width);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            let word_len = word.len();
            if current_len == 0 {
                current = word.into_iter().collect();
                current_len = word_len;
            } else if current_len + 1 + word_len <= width {
                current.push(' ');
                current.extend(word);
                current_len += 1 + word_len;
            } else {
                lines.push(std::mem::replace(&mut current, word.into_iter().collect()));
                current_len = word_len;
            }
        }

        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let colors = palette(app.category(), app.dark_mode);

    frame.render_widget(Block::default().style(Style::default().bg(colors.bg).fg(colors.fg)), area);

    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area, colors);
    render_chat(app, frame, chat_area, colors);
    render_input(app, frame, input_area, colors);
    render_footer(app, frame, footer_area, colors);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect, colors: Palette) {
    let category = app.category();

    let (status_dot, status_label, status_color) = match app.backend_status {
        BackendStatus::Checking => ("○", "checking", colors.muted),
        BackendStatus::Online => ("●", "online", Color::Green),
        BackendStatus::Degraded => ("●", "degraded", Color::Yellow),
        BackendStatus::Offline => ("●", "offline", Color::Red),
    };

    let title = Line::from(vec![
        Span::styled(" ☂ Weather Assistant ", Style::default().fg(colors.accent).bold()),
        Span::styled("AI-powered weather insights ", Style::default().fg(colors.muted)),
        Span::styled(
            format!(" {} {} ", category_icon(category), category.display_name()),
            Style::default().bg(colors.accent).fg(colors.bg).bold(),
        ),
        Span::styled(
            format!(" {} ", ambient_strip(category, app.animation_frame)),
            Style::default().fg(colors.accent),
        ),
        Span::styled(format!("{status_dot} "), Style::default().fg(status_color)),
        Span::styled(
            format!("{} {} ", app.backend_url, status_label),
            Style::default().fg(colors.muted),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(colors.muted),
        ),
    ]);

    frame.render_widget(Paragraph::new(title), area);
}

fn timestamp_label(message: &ChatMessage) -> String {
    message.timestamp.format("%H:%M").to_string()
}

fn insight_lines(insights: &WeatherInsights, width: usize, colors: Palette) -> Vec<Line<'static>> {
    let style = Style::default().fg(colors.muted);
    let entries = [
        ("🌡", &insights.temperature),
        ("☔", &insights.rain),
        ("👕", &insights.clothing),
        ("🚨", &insights.caution),
        ("💡", &insights.advice),
    ];

    entries
        .iter()
        .flat_map(|(icon, value)| {
            wrap_text(&format!("{icon} {value}"), width)
                .into_iter()
                .map(move |line| Line::from(Span::styled(format!("  {line}"), style)))
        })
        .collect()
}

fn chat_lines(app: &App, width: usize, colors: Palette) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let bubble_width = (width * 3 / 4).max(10);

    for message in app.conversation() {
        if message.is_user() {
            lines.push(
                Line::from(vec![
                    Span::styled(timestamp_label(message), Style::default().fg(colors.muted)),
                    Span::styled(
                        " You",
                        Style::default().fg(colors.user).add_modifier(Modifier::BOLD),
                    ),
                ])
                .alignment(Alignment::Right),
            );
            for line in wrap_text(&message.text, bubble_width) {
                lines.push(Line::from(line).alignment(Alignment::Right));
            }
        } else {
            lines.push(Line::from(vec![
                Span::styled(
                    "✦ Assistant ",
                    Style::default().fg(colors.accent).add_modifier(Modifier::BOLD),
                ),
                Span::styled(timestamp_label(message), Style::default().fg(colors.muted)),
            ]));
            for line in wrap_text(&message.text, bubble_width) {
                lines.push(Line::from(line));
            }
            if let Some(insights) = &message.insights {
                lines.extend(insight_lines(insights, bubble_width.saturating_sub(2), colors));
            }
        }
        lines.push(Line::default());
    }

    if app.is_loading() {
        lines.push(Line::from(Span::styled(
            "✦ Assistant",
            Style::default().fg(colors.accent).add_modifier(Modifier::BOLD),
        )));
        let dots = ".".repeat(usize::from(app.animation_frame) + 1);
        lines.push(Line::from(Span::styled(
            format!("⟳ Fetching weather{dots}"),
            Style::default().fg(colors.muted).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect, colors: Palette) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.accent))
        .title(" Conversation ");

    let inner_width = usize::from(area.width.saturating_sub(2));
    let visible = area.height.saturating_sub(2);

    if app.conversation().is_empty() && !app.is_loading() {
        app.chat_max_scroll = 0;
        app.chat_scroll = 0;
        app.chat_height = visible;

        let top_pad = usize::from(visible.saturating_sub(3) / 2);
        let mut lines = vec![Line::default(); top_pad];
        lines.push(Line::from(Span::styled(
            format!("{} No conversations yet", category_icon(WeatherCategory::Default)),
            Style::default().fg(colors.fg).bold(),
        )));
        lines.push(Line::from(Span::styled(
            "Ask about the weather in any city",
            Style::default().fg(colors.muted),
        )));

        let empty = Paragraph::new(Text::from(lines))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let lines = chat_lines(app, inner_width, colors);
    let total = u16::try_from(lines.len()).unwrap_or(u16::MAX);

    app.chat_height = visible;
    app.chat_max_scroll = total.saturating_sub(visible);
    app.chat_scroll = if app.follow_chat {
        app.chat_max_scroll
    } else {
        app.chat_scroll.min(app.chat_max_scroll)
    };

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect, colors: Palette) {
    let editing = app.input_mode == InputMode::Editing;

    let (title, border) = if app.is_loading() {
        (" Fetching weather… ", colors.muted)
    } else if editing {
        (" Ask about the weather… ", colors.accent)
    } else {
        (" Press i to type ", colors.muted)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(title);

    // Keep the cursor inside the box by scrolling long input horizontally
    let inner_width = usize::from(area.width.saturating_sub(2)).max(1);
    let offset = (app.cursor + 1).saturating_sub(inner_width);
    let visible: String = app.input.chars().skip(offset).take(inner_width).collect();

    frame.render_widget(Paragraph::new(visible).block(block), area);

    if editing {
        let x = area.x + 1 + u16::try_from(app.cursor - offset).unwrap_or(0);
        frame.set_cursor_position((x, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect, colors: Palette) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" INSERT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().fg(colors.fg);

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];

    let hints: &[(&str, &str)] = match app.input_mode {
        InputMode::Editing => &[
            (" Enter ", " send "),
            (" Esc ", " normal "),
            (" ↑/↓ ", " scroll "),
            (" ^U ", " clear "),
            (" ^C ", " quit "),
        ],
        InputMode::Normal => &[
            (" i ", " type "),
            (" j/k ", " scroll "),
            (" g/G ", " top/bottom "),
            (" t ", " theme "),
            (" q ", " quit "),
        ],
    };

    for (key, label) in hints {
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::styled(*label, label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
