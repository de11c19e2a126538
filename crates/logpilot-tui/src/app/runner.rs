use std::io;
use std::sync::Arc;
use std::time::Duration;

use logpilot_server::Session;
use ratatui::layout::Rect;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::app::{Action, DashboardState, Snapshot};
use crate::config::{KeyBindings, KeyContext};
use crate::tui::{Event, EventHandler, Tui};
use crate::ui::{Layout, components::HelpOverlay, screens::DashboardScreen};

/// What the dashboard shows besides the session itself
#[derive(Clone, Debug)]
pub struct DashboardOptions {
    pub title: String,
    pub url: String,
    pub tick_rate: Duration,
}

/// Draw the dashboard until the user quits or `cancel` fires.
///
/// Quitting cancels `cancel` so the server and the input source wind down
/// with the screen.
pub async fn run_dashboard(
    session: Arc<Session>,
    options: DashboardOptions,
    cancel: CancellationToken,
) -> io::Result<()> {
    let mut tui = Tui::new()?;
    let mut events = EventHandler::new(options.tick_rate);
    let keybindings = KeyBindings::new();
    let mut state = DashboardState::new(options.title, options.url);

    let result = async {
        refresh(&mut tui, &mut state, &session)?;

        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.next() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            let action = match event {
                Event::Tick => Some(Action::Tick),
                Event::Resize(_, _) => Some(Action::Render),
                Event::Key(key) => {
                    let context = if state.help_visible {
                        KeyContext::Help
                    } else {
                        KeyContext::Dashboard
                    };
                    keybindings.get_action(context, &key)
                }
                Event::Error(e) => {
                    warn!(error = %e, "Terminal input error");
                    None
                }
            };

            let Some(action) = action else { continue };
            if let Some(request) = state.handle(action) {
                debug!(?request, "Dashboard control request");
                session.request(request);
            }
            if state.should_quit {
                break;
            }
            refresh(&mut tui, &mut state, &session)?;
        }

        Ok(())
    }
    .await;

    events.shutdown().await;
    tui.restore()?;
    cancel.cancel();
    result
}

fn refresh(tui: &mut Tui, state: &mut DashboardState, session: &Session) -> io::Result<()> {
    let size = tui.terminal().size()?;
    let (_, content, _) = Layout::main(Rect::new(0, 0, size.width, size.height));
    state.snapshot = Snapshot::capture(session, Layout::tail_rows(content));

    tui.terminal().draw(|frame| {
        DashboardScreen::render(frame, state);

        if state.help_visible {
            HelpOverlay::render(frame);
        }
    })?;

    Ok(())
}
