use chrono::Local;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use clickgate_core::Status;
use crate::App;

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = if app.log_visible {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(f.area())
    } else {
        Layout::default()
            .constraints([Constraint::Percentage(100)])
            .split(f.area())
    };

    let status = app.status();

    // -- Left panel: banner + status --
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(chunks[0]);

    let (banner_label, banner_bg) = banner(&status);
    let banner_width = left_chunks[0].width as usize;
    let pad_total = banner_width.saturating_sub(banner_label.len());
    let pad_left = pad_total / 2;
    let pad_right = pad_total - pad_left;
    let centered_banner = format!("{}{}{}", " ".repeat(pad_left), banner_label, " ".repeat(pad_right));
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            centered_banner,
            Style::default().fg(Color::Black).bg(banner_bg).add_modifier(Modifier::BOLD),
        ))),
        left_chunks[0],
    );

    let status_panel = Paragraph::new(status_lines(app, &status))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::RIGHT | Borders::BOTTOM)
                .border_style(Style::default().fg(Color::Cyan)),
        );
    f.render_widget(status_panel, left_chunks[1]);

    // -- Right panel: logs --
    if app.log_visible && chunks.len() > 1 {
        let visible_height = chunks[1].height.saturating_sub(2) as usize;
        let total = app.log_messages.len();
        let max_scroll = total.saturating_sub(visible_height);
        let scroll = app.log_scroll.min(max_scroll);
        let start = total.saturating_sub(visible_height + scroll);
        let end = total.saturating_sub(scroll);
        let log_lines: Vec<Line> = app.log_messages[start..end]
            .iter()
            .map(|m| parse_log_line(m))
            .collect();

        let log_panel = Paragraph::new(log_lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Logs ")
                    .border_style(Style::default().fg(Color::Yellow)),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(log_panel, chunks[1]);
    }

    if let Some(dialog) = &app.confirm {
        dialog.render(f);
    }
}

fn banner(status: &Status) -> (String, Color) {
    let color = match (status.paused, status.dry_run) {
        (true, _) => Color::Yellow,
        (false, true) => Color::Cyan,
        (false, false) => Color::Red,
    };
    (status.mode_label().to_string(), color)
}

fn status_lines(app: &App, status: &Status) -> Vec<Line<'static>> {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));
    let label = |l: &'static str| Span::styled(l, Style::default().fg(Color::DarkGray));

    let last_click = status
        .last_click_ts
        .map(|ts| ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "never".into());
    let last_match = status.last_match.clone().unwrap_or_else(|| "none".into());

    vec![
        Line::from(vec![
            Span::raw(" "),
            key("p"),
            Span::raw(" pause  "),
            key("d"),
            Span::raw(" dry-run  "),
            key("r"),
            Span::raw(" reload  "),
            key("l"),
            Span::raw(" logs  "),
            key("q"),
            Span::raw(" quit"),
        ]),
        Line::from(""),
        Line::from(vec![label(" last match   "), Span::styled(last_match, Style::default().fg(Color::White))]),
        Line::from(vec![label(" last click   "), Span::styled(last_click, Style::default().fg(Color::White))]),
        Line::from(vec![label(" poll         "), Span::raw(format!("{} ms", status.poll_interval_ms))]),
        Line::from(vec![label(" cooldown     "), Span::raw(format!("{} ms", status.click_cooldown_ms))]),
        Line::from(vec![
            label(" settings     "),
            Span::styled(app.settings_path.display().to_string(), Style::default().fg(Color::DarkGray)),
        ]),
    ]
}

/// Parse a structured log line (level\x1fprefix\x1fcolor\x1ftimestamp\x1fmessage)
/// into a colored Line for TUI rendering.
fn parse_log_line(raw: &str) -> Line<'_> {
    let parts: Vec<&str> = raw.splitn(5, '\x1f').collect();
    if parts.len() < 5 {
        return Line::from(raw);
    }

    let level = parts[0];
    let prefix = parts[1];
    let color_idx: u8 = parts[2].parse().unwrap_or(0);
    let timestamp = parts[3];
    let message = parts[4];

    let prefix_color = match color_idx {
        1 => Color::DarkGray,  // COLOR_GRAY
        2 => Color::LightBlue, // COLOR_BLUE
        _ => Color::White,
    };

    let mut spans = vec![
        Span::styled(timestamp, Style::default().fg(Color::DarkGray)),
        Span::raw(" "),
    ];

    match level {
        "ERROR" => spans.push(Span::styled("error ", Style::default().fg(Color::Red))),
        "WARN" => spans.push(Span::styled("warn ", Style::default().fg(Color::Yellow))),
        "DEBUG" => spans.push(Span::styled("debug ", Style::default().fg(Color::DarkGray))),
        _ => {}
    }

    if !prefix.is_empty() {
        spans.push(Span::styled(prefix, Style::default().fg(prefix_color).add_modifier(Modifier::BOLD)));
        spans.push(Span::raw(" "));
    }

    spans.push(Span::styled(message, Style::default().fg(prefix_color)));
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_line_gets_level_tag_and_prefix() {
        let line = parse_log_line("WARN\x1fstub\x1f1\x1f12:00:01\x1fmatched");
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "12:00:01 warn stub matched");
    }

    #[test]
    fn unstructured_line_passes_through() {
        let line = parse_log_line("plain text");
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "plain text");
    }

    #[test]
    fn banner_colors_follow_mode() {
        let mut status = Status {
            paused: false,
            dry_run: false,
            last_click_ts: None,
            last_match: None,
            poll_interval_ms: 350,
            click_cooldown_ms: 5000,
        };
        assert_eq!(banner(&status), ("RUNNING (live)".to_string(), Color::Red));
        status.paused = true;
        assert_eq!(banner(&status).1, Color::Yellow);
    }
}
