// Key bindings: terminal key events to actions

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::action::Action;
use crate::session::Mode;
use crate::ui_state::{Focus, Screen};

pub fn map_key(screen: Screen, focus: Focus, key: KeyEvent) -> Option<Action> {
    // Release and repeat events are reported on some terminals
    if key.kind != KeyEventKind::Press {
        return None;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    if screen == Screen::Home {
        return match key.code {
            KeyCode::Esc => Some(Action::Quit),
            KeyCode::Char('c') if ctrl => Some(Action::Quit),
            _ => Some(Action::Start),
        };
    }

    let action = match key.code {
        KeyCode::Char('c') if ctrl => Action::Quit,
        KeyCode::Char('v') if ctrl => Action::PasteClipboard,
        KeyCode::Char('l') if ctrl => Action::NewSession,
        KeyCode::Char(_) if ctrl => return None,
        KeyCode::F(n @ 1..=4) => Action::SetMode(Mode::ALL[n as usize - 1]),
        KeyCode::F(5) => Action::ToggleHelp,
        KeyCode::F(6) => Action::ToggleRawMarkdown,
        KeyCode::Tab | KeyCode::BackTab => Action::CycleFocus,
        KeyCode::Esc => Action::Escape,
        KeyCode::Backspace => Action::DeleteLast,
        KeyCode::Delete => Action::ClearInput,
        KeyCode::PageUp => Action::ScrollUp,
        KeyCode::PageDown => Action::ScrollDown,
        KeyCode::Enter => match focus {
            Focus::Input => Action::Submit,
            Focus::Keypad | Focus::Sidebar => Action::Activate,
        },
        KeyCode::Char(' ') if focus == Focus::Keypad => Action::Activate,
        KeyCode::Up => match focus {
            Focus::Input => Action::ScrollUp,
            _ => Action::Up,
        },
        KeyCode::Down => match focus {
            Focus::Input => Action::ScrollDown,
            _ => Action::Down,
        },
        KeyCode::Right if focus == Focus::Sidebar => Action::ShowDetails,
        KeyCode::Left if focus == Focus::Sidebar => return None,
        KeyCode::Left => Action::Left,
        KeyCode::Right => Action::Right,
        KeyCode::Char(c) => Action::Insert(c.to_string()),
        _ => return None,
    };

    Some(action)
}
