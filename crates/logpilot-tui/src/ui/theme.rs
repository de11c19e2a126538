use logpilot_server::ProcessStatus;
use ratatui::style::{Color, Modifier, Style};

/// Colours used by the dashboard
pub struct Theme;

impl Theme {
    pub const ACCENT: Color = Color::Cyan;
    pub const MUTED: Color = Color::DarkGray;
    pub const KEY: Color = Color::Yellow;

    pub fn brand() -> Style {
        Style::default()
            .fg(Self::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn separator() -> Style {
        Style::default().fg(Self::MUTED)
    }

    pub fn command() -> Style {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }

    pub fn url() -> Style {
        Style::default()
            .fg(Self::ACCENT)
            .add_modifier(Modifier::UNDERLINED)
    }

    pub fn counter() -> Style {
        Style::default().fg(Color::White)
    }

    pub fn log_line() -> Style {
        Style::default().fg(Color::Gray)
    }

    pub fn placeholder() -> Style {
        Style::default()
            .fg(Self::MUTED)
            .add_modifier(Modifier::ITALIC)
    }

    pub fn frame() -> Style {
        Style::default().fg(Self::MUTED)
    }

    /// Green while output is flowing, red after a non-zero exit
    pub fn process(status: &ProcessStatus) -> Style {
        let color = match status {
            ProcessStatus::Running { .. } | ProcessStatus::Piped => Color::Green,
            ProcessStatus::Exited { code: Some(code), .. } if *code != 0 => Color::Red,
            ProcessStatus::Exited { .. } | ProcessStatus::Waiting => Color::Yellow,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    pub fn status_bar() -> Style {
        Style::default().fg(Color::Gray).bg(Self::MUTED)
    }

    pub fn status_bar_key() -> Style {
        Self::status_bar().fg(Self::KEY).add_modifier(Modifier::BOLD)
    }

    pub fn notice() -> Style {
        Self::status_bar().fg(Color::White).add_modifier(Modifier::BOLD)
    }

    pub fn help_heading() -> Style {
        Style::default().fg(Self::KEY)
    }

    pub fn help_key() -> Style {
        Style::default().fg(Color::Green)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    #[test]
    fn test_process_colours() {
        let at = Local::now();
        assert_eq!(Theme::process(&ProcessStatus::Piped).fg, Some(Color::Green));
        assert_eq!(
            Theme::process(&ProcessStatus::Exited { code: Some(1), at }).fg,
            Some(Color::Red)
        );
        assert_eq!(
            Theme::process(&ProcessStatus::Exited { code: None, at }).fg,
            Some(Color::Yellow)
        );
    }
}
