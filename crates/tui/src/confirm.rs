use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use clickgate_core::Settings;

const WIDTH: u16 = 56;

/// Shown before leaving dry-run: the gates the engine will click through.
pub struct GoLiveDialog {
    details: Vec<String>,
    go_live: bool,
}

impl GoLiveDialog {
    pub fn new(settings: &Settings) -> Self {
        Self {
            details: go_live_details(settings),
            go_live: false,
        }
    }

    pub fn details(&self) -> &[String] {
        &self.details
    }

    pub fn go_live(&self) -> bool {
        self.go_live
    }

    pub fn toggle(&mut self) {
        self.go_live = !self.go_live;
    }

    pub fn choose_live(&mut self) {
        self.go_live = true;
    }

    pub fn render(&self, f: &mut Frame) {
        // border + headline + gap + details + gap + buttons + border
        let height = self.details.len() as u16 + 6;
        let area = centered_rect(WIDTH, height, f.area());
        f.render_widget(Clear, area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" Go live ");

        let mut lines = vec![
            Line::from(Span::styled(
                "Real clicks will be sent to matching windows.",
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )),
            Line::default(),
        ];
        lines.extend(
            self.details
                .iter()
                .map(|d| Line::from(Span::styled(d.as_str(), Style::default().fg(Color::Gray)))),
        );
        lines.push(Line::default());
        lines.push(self.choice_line());

        let body = Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(body, area);
    }

    fn choice_line(&self) -> Line<'static> {
        let active = |bg: Color| Style::default().fg(Color::Black).bg(bg).add_modifier(Modifier::BOLD);
        let idle = Style::default().fg(Color::DarkGray);
        let (live, stay) = if self.go_live {
            (active(Color::Red), idle)
        } else {
            (idle, active(Color::Green))
        };
        Line::from(vec![
            Span::styled(" [y] Go live ", live),
            Span::raw("   "),
            Span::styled(" [n] Stay in dry-run ", stay),
        ])
    }
}

fn list_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}

/// One line per gate the operator is about to rely on.
fn go_live_details(settings: &Settings) -> Vec<String> {
    let mut details = vec![
        format!("processes: {}", list_or(&settings.allowed_processes, "(none, nothing will match)")),
        format!("buttons: {}", list_or(&settings.button_texts, "(none, nothing will match)")),
        format!("cooldown: {} ms", settings.click_cooldown_ms),
    ];
    if !settings.allowed_window_title_contains.is_empty() {
        details.insert(1, format!("titles containing: {}", settings.allowed_window_title_contains.join(", ")));
    }
    if !settings.require_near_text_contains.is_empty() {
        details.push(format!("only near: {}", settings.require_near_text_contains.join(", ")));
    }
    if settings.allow_focus {
        details.push("may steal focus to click".to_string());
    }
    details
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
