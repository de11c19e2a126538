use ratatui::{
    Frame,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::ui::{Layout, Theme};

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Process",
        &[("r", "Restart the command"), ("s", "Stop the command")],
    ),
    (
        "Dashboard",
        &[
            ("?", "Toggle this help"),
            ("Esc", "Close this help"),
            ("q", "Quit"),
            ("Ctrl+c", "Quit"),
        ],
    ),
];

/// Help overlay showing keybindings
pub struct HelpOverlay;

impl HelpOverlay {
    pub fn render(frame: &mut Frame) {
        let mut text = vec![
            Line::from(Span::styled(
                "Keybindings",
                Style::default().add_modifier(Modifier::BOLD),
            )),
        ];
        for (heading, keys) in SECTIONS {
            text.push(Line::from(""));
            text.push(Line::from(Span::styled(*heading, Theme::help_heading())));
            text.extend(keys.iter().map(|&(key, desc)| Self::key_line(key, desc)));
        }

        // Border plus one line of slack
        let height = text.len() as u16 + 3;
        let popup_area = Layout::centered(frame.area(), 44, height);
        frame.render_widget(Clear, popup_area);

        let help_widget = Paragraph::new(text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Theme::ACCENT))
                .title(Span::styled(" Help ", Theme::brand())),
        );

        frame.render_widget(help_widget, popup_area);
    }

    fn key_line(key: &'static str, desc: &'static str) -> Line<'static> {
        Line::from(vec![
            Span::styled(format!("  {:>8}", key), Theme::help_key()),
            Span::styled(format!("  {}", desc), Theme::counter()),
        ])
    }
}
