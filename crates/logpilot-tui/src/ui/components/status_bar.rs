use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Margin, Rect},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::ui::Theme;

/// Bottom line: key hints on the left, a notice or plain text on the right
pub struct StatusBar<'a> {
    hints: &'a [(&'a str, &'a str)],
    notice: Option<&'a str>,
    right: String,
}

/// Hints shown on the dashboard
pub const DASHBOARD_HINTS: &[(&str, &str)] = &[
    ("r", "Restart"),
    ("s", "Stop"),
    ("?", "Help"),
    ("q", "Quit"),
];

impl<'a> StatusBar<'a> {
    pub fn new(hints: &'a [(&'a str, &'a str)]) -> Self {
        Self {
            hints,
            notice: None,
            right: String::new(),
        }
    }

    /// Text shown on the right when there is no notice
    pub fn right(mut self, text: impl Into<String>) -> Self {
        self.right = text.into();
        self
    }

    /// Short-lived message that takes the right side's place
    pub fn notice(mut self, notice: Option<&'a str>) -> Self {
        self.notice = notice;
        self
    }

    fn hint_line(&self) -> Line<'a> {
        let mut spans = Vec::with_capacity(self.hints.len() * 3);
        for (key, desc) in self.hints {
            if !spans.is_empty() {
                spans.push(Span::styled("  ", Theme::status_bar()));
            }
            spans.push(Span::styled(format!("[{key}]"), Theme::status_bar_key()));
            spans.push(Span::styled(format!(" {desc}"), Theme::status_bar()));
        }
        Line::from(spans)
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, Theme::status_bar());

        let right = match self.notice {
            Some(notice) => Span::styled(format!("{notice} "), Theme::notice()),
            None => Span::styled(format!("{} ", self.right), Theme::status_bar()),
        };
        let right_width = right.content.width() as u16;

        // The hints keep their room; the right side is cut first
        let [left_area, right_area] =
            Layout::horizontal([Constraint::Min(0), Constraint::Length(right_width)]).areas(area);

        Paragraph::new(self.hint_line())
            .style(Theme::status_bar())
            .render(left_area.inner(Margin::new(1, 0)), buf);
        Paragraph::new(Line::from(right))
            .alignment(Alignment::Right)
            .render(right_area, buf);
    }
}
