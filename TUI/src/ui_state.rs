#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Home,
    Calculator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Input,
    Keypad,
    Sidebar,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Input => Focus::Keypad,
            Focus::Keypad => Focus::Sidebar,
            Focus::Sidebar => Focus::Input,
        }
    }
}

#[derive(Default)]
pub struct UIState {
    pub screen: Screen,
    pub focus: Focus,
    /// Lines scrolled up from the bottom of the transcript
    pub scroll_offset: usize,
    pub status_message: Option<String>,
    // Tick at which the status message is cleared
    pub status_expires_at: u64,

    // Highlighted sidebar row: modes first, then recent history
    pub sidebar_cursor: usize,

    // Sample under the chart cursor
    pub plot_cursor: usize,

    pub show_raw_markdown: bool,
    pub show_help: bool,

    // Send animation state (ticks remaining)
    pub send_animation: u8,
}

impl UIState {
    pub fn new() -> Self {
        Self::default()
    }
}
