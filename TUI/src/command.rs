use crate::action::Action;
use crate::session::Mode;

/// Slash commands accepted in the input line.
pub const COMMANDS: &[(&str, &str)] = &[
    ("/help", "Show keys and commands"),
    ("/new", "Start a new session"),
    ("/mode", "Switch mode: general, solver, graphing, stats"),
    ("/raw", "Toggle raw solution text"),
    ("/quit", "Exit Benny"),
];

pub struct CommandParser;

impl CommandParser {
    /// A slash followed by a letter. `/2` is still an expression.
    pub fn is_command(input: &str) -> bool {
        let mut chars = input.trim_start().chars();
        chars.next() == Some('/') && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
    }

    pub fn parse(input: &str) -> Result<Action, String> {
        let input = input.trim();
        if !Self::is_command(input) {
            return Err("Not a command".to_string());
        }

        let (cmd, args) = input.split_once(' ').unwrap_or((input, ""));
        let args = args.trim();

        match cmd {
            "/help" => Ok(Action::ToggleHelp),
            "/new" | "/clear" => Ok(Action::NewSession),
            "/raw" => Ok(Action::ToggleRawMarkdown),
            "/quit" => Ok(Action::Quit),
            "/mode" => match parse_mode(args) {
                Some(mode) => Ok(Action::SetMode(mode)),
                None => Err("Usage: /mode <general|solver|graphing|stats>".to_string()),
            },
            _ => Err(format!("Unknown command: {}. Type /help for available commands.", cmd)),
        }
    }
}

fn parse_mode(name: &str) -> Option<Mode> {
    match name.to_ascii_lowercase().as_str() {
        "general" | "calc" => Some(Mode::General),
        "solver" | "ai" => Some(Mode::Solver),
        "graphing" | "graph" => Some(Mode::Graphing),
        "statistics" | "stats" => Some(Mode::Statistics),
        _ => None,
    }
}
