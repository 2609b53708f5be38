use crate::session::Mode;

/// User actions produced by key bindings, slash commands or terminal events.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Leave the home screen
    Start,
    Quit,
    /// Append a token to the expression
    Insert(String),
    /// Append pasted text, newlines flattened
    Paste(String),
    /// Read the system clipboard, then paste
    PasteClipboard,
    DeleteLast,
    ClearInput,
    /// Close help, else clear input, else quit
    Escape,
    Submit,
    CycleFocus,
    Up,
    Down,
    Left,
    Right,
    /// Press the highlighted key or sidebar row
    Activate,
    /// Show the stored result of the highlighted history row
    ShowDetails,
    SetMode(Mode),
    NewSession,
    ToggleRawMarkdown,
    ToggleHelp,
    ScrollUp,
    ScrollDown,
}
