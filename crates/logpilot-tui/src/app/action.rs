/// Everything the dashboard reacts to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,

    // Process control, forwarded to the input source
    Restart,
    Stop,

    // UI toggles
    ToggleHelp,
    CloseHelp,

    /// Periodic refresh; also expires the notice
    Tick,
    Render,
}
