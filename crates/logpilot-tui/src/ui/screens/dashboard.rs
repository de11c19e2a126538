use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::{
    app::DashboardState,
    ui::{
        Layout, Theme,
        components::{DASHBOARD_HINTS, StatusBar},
    },
};

/// Single screen: title, URL, counters and the tail of the log
pub struct DashboardScreen;

impl DashboardScreen {
    pub fn render(frame: &mut Frame, state: &DashboardState) {
        let (header_area, content_area, status_area) = Layout::main(frame.area());

        Self::render_header(frame, header_area, state);
        Self::render_tail(frame, content_area, state);
        Self::render_status_bar(frame, status_area, state);
    }

    fn render_header(frame: &mut Frame, area: Rect, state: &DashboardState) {
        let snapshot = &state.snapshot;
        let sep = || Span::styled(" │ ", Theme::separator());

        let title = Line::from(vec![
            Span::styled("logpilot", Theme::brand()),
            sep(),
            Span::styled(state.title.as_str(), Theme::command()),
            sep(),
            Span::styled(state.status_label(), Theme::process(&snapshot.status)),
        ]);

        let clients = match snapshot.client_count {
            1 => "1 client".to_string(),
            n => format!("{n} clients"),
        };
        let url = Line::from(vec![
            Span::styled(state.url.as_str(), Theme::url()),
            sep(),
            Span::styled(format!("{} lines", snapshot.line_count), Theme::counter()),
            sep(),
            Span::styled(clients, Theme::counter()),
        ]);

        let header = Paragraph::new(vec![title, url]).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::frame()),
        );

        frame.render_widget(header, area);
    }

    fn render_tail(frame: &mut Frame, area: Rect, state: &DashboardState) {
        let tail = &state.snapshot.tail;
        let body = if tail.is_empty() {
            Paragraph::new(Line::styled("waiting for output…", Theme::placeholder()))
        } else {
            Paragraph::new(
                tail.iter()
                    .map(|line| Line::styled(line.as_str(), Theme::log_line()))
                    .collect::<Vec<_>>(),
            )
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::frame())
            .title(Span::styled(" Output ", Theme::separator()));

        frame.render_widget(body.block(block), area);
    }

    fn render_status_bar(frame: &mut Frame, area: Rect, state: &DashboardState) {
        let updated = state.snapshot.taken_at.format("updated %H:%M:%S").to_string();

        let status = StatusBar::new(DASHBOARD_HINTS)
            .right(updated)
            .notice(state.notice.as_deref());

        frame.render_widget(status, area);
    }
}
