use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

use crate::action::Action;
use crate::command::CommandParser;
use crate::config::Config;
use crate::dispatcher::{DispatchOutcome, Dispatcher};
use crate::keypad::{KeyPress, Keypad};
use crate::session::{Mode, Session, SubmitError};
use crate::ui_state::{Focus, Screen, UIState};

/// One selectable row of the sidebar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SidebarItem {
    Mode(Mode),
    Entry(Uuid),
}

pub struct App {
    pub config: Config,
    pub session: Session,
    pub ui: UIState,
    pub keypad: Keypad,
    pub animation_frame: usize,
    pub animation_tick: u64,
    pub should_quit: bool,
    /// Model name, or "offline"
    pub solver_label: String,
    dispatcher: Dispatcher,
    runtime: Handle,
    outcome_tx: UnboundedSender<DispatchOutcome>,
    outcome_rx: UnboundedReceiver<DispatchOutcome>,
}

impl App {
    pub fn new(config: Config, dispatcher: Dispatcher, runtime: Handle, solver_label: impl Into<String>) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        Self {
            config,
            session: Session::new(),
            ui: UIState::new(),
            keypad: Keypad::new(),
            animation_frame: 0,
            animation_tick: 0,
            should_quit: false,
            solver_label: solver_label.into(),
            dispatcher,
            runtime,
            outcome_tx,
            outcome_rx,
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.ui.status_message = Some(message.into());
        self.ui.status_expires_at = self.animation_tick + self.config.status_timeout_ticks;
    }

    pub fn tick(&mut self) {
        self.animation_tick += 1;
        self.animation_frame = (self.animation_frame + 1) % self.config.animation_frame_mod;
        self.ui.send_animation = self.ui.send_animation.saturating_sub(1);

        if self.ui.status_message.is_some() && self.animation_tick >= self.ui.status_expires_at {
            self.ui.status_message = None;
        }

        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.apply_outcome(outcome);
        }
    }

    fn apply_outcome(&mut self, outcome: DispatchOutcome) {
        if let Some(entry) = self.session.complete_dispatch(outcome) {
            tracing::debug!(id = %entry.id(), answer = entry.result().final_answer(), "result recorded");
            self.ui.plot_cursor = 0;
            self.ui.scroll_offset = 0;
        }
    }

    /// Modes first, then the most recent history entries.
    pub fn sidebar_items(&self) -> Vec<SidebarItem> {
        let mut items: Vec<SidebarItem> = Mode::ALL.iter().copied().map(SidebarItem::Mode).collect();
        items.extend(
            self.session
                .history()
                .recent(self.config.history_display_limit)
                .map(|entry| SidebarItem::Entry(entry.id())),
        );
        items
    }

    fn highlighted_entry(&self) -> Option<Uuid> {
        match self.sidebar_items().get(self.ui.sidebar_cursor) {
            Some(SidebarItem::Entry(id)) => Some(*id),
            _ => None,
        }
    }

    fn plot_len(&self) -> usize {
        self.session
            .current_result()
            .and_then(|r| r.plot_points())
            .map_or(0, |points| points.len())
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Start => {
                self.ui.screen = Screen::Calculator;
                tracing::info!(solver = %self.solver_label, "calculator started");
            }
            Action::Quit => self.should_quit = true,
            Action::Insert(token) => self.session.expression.append(&token),
            Action::Paste(text) => {
                for c in text.chars() {
                    match c {
                        '\r' => {}
                        '\n' => self.session.expression.push(' '),
                        c => self.session.expression.push(c),
                    }
                }
            }
            // The event loop owns the clipboard and turns this into `Paste`
            Action::PasteClipboard => {}
            Action::DeleteLast => self.session.expression.delete_last(),
            Action::ClearInput => self.session.expression.clear(),
            Action::Escape => {
                if self.ui.show_help {
                    self.ui.show_help = false;
                } else if self.session.expression.is_empty() {
                    self.should_quit = true;
                } else {
                    self.session.expression.clear();
                }
            }
            Action::Submit => self.submit(),
            Action::CycleFocus => self.ui.focus = self.ui.focus.next(),
            Action::Up => match self.ui.focus {
                Focus::Keypad => self.keypad.move_up(),
                Focus::Sidebar => self.ui.sidebar_cursor = self.ui.sidebar_cursor.saturating_sub(1),
                Focus::Input => self.apply(Action::ScrollUp),
            },
            Action::Down => match self.ui.focus {
                Focus::Keypad => self.keypad.move_down(),
                Focus::Sidebar => {
                    let last = self.sidebar_items().len().saturating_sub(1);
                    self.ui.sidebar_cursor = (self.ui.sidebar_cursor + 1).min(last);
                }
                Focus::Input => self.apply(Action::ScrollDown),
            },
            Action::Left => match self.ui.focus {
                Focus::Keypad => self.keypad.move_left(),
                _ => self.ui.plot_cursor = self.ui.plot_cursor.saturating_sub(1),
            },
            Action::Right => match self.ui.focus {
                Focus::Keypad => self.keypad.move_right(),
                _ => {
                    let last = self.plot_len().saturating_sub(1);
                    self.ui.plot_cursor = (self.ui.plot_cursor + 1).min(last);
                }
            },
            Action::Activate => match self.ui.focus {
                Focus::Keypad => self.press_keypad(),
                Focus::Sidebar => self.activate_sidebar(),
                Focus::Input => self.submit(),
            },
            Action::ShowDetails => {
                if let Some(id) = self.highlighted_entry() {
                    if self.session.show(id) {
                        self.ui.plot_cursor = 0;
                    }
                }
            }
            Action::SetMode(mode) => {
                self.session.mode = mode;
                tracing::debug!(mode = mode.badge(), "mode changed");
                self.set_status(format!("Mode: {}", mode.label()));
            }
            Action::NewSession => {
                self.session.reset();
                self.ui.scroll_offset = 0;
                self.ui.plot_cursor = 0;
                self.ui.sidebar_cursor = 0;
                tracing::info!("new session");
                self.set_status("New session started");
            }
            Action::ToggleRawMarkdown => self.ui.show_raw_markdown = !self.ui.show_raw_markdown,
            Action::ToggleHelp => self.ui.show_help = !self.ui.show_help,
            Action::ScrollUp => self.ui.scroll_offset += self.config.scroll_step,
            Action::ScrollDown => {
                self.ui.scroll_offset = self.ui.scroll_offset.saturating_sub(self.config.scroll_step)
            }
        }
    }

    fn press_keypad(&mut self) {
        match self.keypad.press() {
            KeyPress::Insert(token) => self.session.expression.append(token),
            KeyPress::Clear => self.session.expression.clear(),
            KeyPress::Backspace => self.session.expression.delete_last(),
            KeyPress::Solve => self.submit(),
            KeyPress::Consumed => {}
        }
    }

    fn activate_sidebar(&mut self) {
        match self.sidebar_items().get(self.ui.sidebar_cursor).copied() {
            Some(SidebarItem::Mode(mode)) => self.apply(Action::SetMode(mode)),
            Some(SidebarItem::Entry(id)) => {
                if self.session.replay(id) {
                    self.ui.focus = Focus::Input;
                    self.set_status("Expression restored, press Enter to solve");
                }
            }
            None => {}
        }
    }

    /// Run a slash command, or hand the expression to the dispatcher.
    pub fn submit(&mut self) {
        let input = self.session.expression.as_str().trim().to_string();

        if CommandParser::is_command(&input) {
            self.session.expression.clear();
            match CommandParser::parse(&input) {
                Ok(action) => self.apply(action),
                Err(message) => self.set_status(message),
            }
            return;
        }

        match self.session.begin_dispatch(self.config.context_window) {
            Ok(request) => {
                self.dispatcher.spawn(&self.runtime, request, self.outcome_tx.clone());
                self.ui.send_animation = self.config.send_animation_ticks;
                self.ui.scroll_offset = 0;
            }
            Err(SubmitError::Blank) => {}
            Err(e @ SubmitError::Busy(_)) => self.set_status(format!("Hold on, {}", e)),
        }
    }
}
