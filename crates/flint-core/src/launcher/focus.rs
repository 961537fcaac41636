//! Keyboard routing and the search / results / header focus cycle.

use super::{Launcher, LauncherUpdate};
use flint_types::{FocusMode, Key, KeyPress};
use tracing::debug;

impl Launcher {
    /// Handle a key press. Returns true if the key was consumed; unconsumed
    /// keys belong to the search entry.
    pub fn handle_key(&mut self, press: KeyPress) -> bool {
        let shift = press.modifiers.shift;
        if press.key != Key::Backspace {
            self.state.backspace_pending = false;
        }
        match press.key {
            Key::Escape => {
                self.handle_escape();
                true
            }
            Key::Tab if shift => {
                self.focus_previous();
                true
            }
            Key::Tab => {
                self.focus_next();
                true
            }
            Key::Down => self.move_down(),
            Key::Up => self.move_up(),
            Key::PageDown => self.move_by(self.page_step()),
            Key::PageUp => self.move_by(-self.page_step()),
            Key::Home => self.select_first(),
            Key::End => self.select_last(),
            Key::Enter => {
                self.handle_enter(shift);
                true
            }
            Key::Backspace => {
                if self.state.in_trigger_mode() {
                    self.state.backspace_pending = true;
                }
                false
            }
            Key::Other => false,
        }
    }

    /// Cancel a widget input, else close a seeded launcher, else leave
    /// trigger mode, else close.
    fn handle_escape(&mut self) {
        let cancelled = self.state.results.iter().any(|result| {
            result
                .custom_widget
                .as_ref()
                .and_then(|widget| widget.as_cancelable())
                .is_some_and(|cancelable| cancelable.cancel())
        });
        if cancelled {
            debug!("Escape cancelled widget input");
            return;
        }

        if self.state.opened_with_trigger {
            self.hide_launcher();
        } else if self.state.in_trigger_mode() {
            self.exit_trigger_mode();
            self.set_entry_text("");
            self.state.query.clear();
            self.replace_results(Vec::new(), true);
            self.set_focus(FocusMode::Search);
        } else {
            self.hide_launcher();
        }
    }

    fn focus_next(&mut self) {
        let has_results = !self.state.results.is_empty();
        let buttons = self.state.header_button_count;

        match self.state.focus_mode {
            FocusMode::Search if has_results => self.focus_results(0),
            FocusMode::Search | FocusMode::Results if buttons > 0 => self.focus_header(0),
            FocusMode::Search => {}
            FocusMode::Results => self.set_focus(FocusMode::Search),
            FocusMode::Header => {
                let next = self.state.header_button_index + 1;
                if next < buttons {
                    self.focus_header(next);
                } else {
                    self.set_focus(FocusMode::Search);
                }
            }
        }
    }

    fn focus_previous(&mut self) {
        let buttons = self.state.header_button_count;

        match self.state.focus_mode {
            FocusMode::Search if buttons > 0 => self.focus_header(buttons - 1),
            FocusMode::Search => {}
            FocusMode::Results => self.set_focus(FocusMode::Search),
            FocusMode::Header => {
                if self.state.header_button_index > 0 {
                    self.focus_header(self.state.header_button_index - 1);
                } else if self.state.results.is_empty() {
                    self.set_focus(FocusMode::Search);
                } else {
                    self.focus_results(self.state.results.len() - 1);
                }
            }
        }
    }

    fn move_down(&mut self) -> bool {
        let len = self.state.results.len();
        if len == 0 {
            return false;
        }
        match self.state.focus_mode {
            FocusMode::Search => self.focus_results(0),
            FocusMode::Results => self.select((self.state.selected_index + 1) % len),
            FocusMode::Header => return false,
        }
        true
    }

    fn move_up(&mut self) -> bool {
        if self.state.focus_mode != FocusMode::Results {
            return false;
        }
        if self.state.selected_index == 0 {
            self.set_focus(FocusMode::Search);
        } else {
            self.select(self.state.selected_index - 1);
        }
        true
    }

    fn move_by(&mut self, delta: isize) -> bool {
        let len = self.state.results.len();
        if len == 0 {
            return false;
        }
        let target = self
            .state
            .selected_index
            .saturating_add_signed(delta)
            .min(len - 1);
        self.select(target);
        true
    }

    fn select_first(&mut self) -> bool {
        if self.state.results.is_empty() {
            return false;
        }
        self.select(0);
        true
    }

    fn select_last(&mut self) -> bool {
        let len = self.state.results.len();
        if len == 0 {
            return false;
        }
        self.select(len - 1);
        true
    }

    fn page_step(&self) -> isize {
        isize::try_from(self.config.launcher.page_step).unwrap_or(isize::MAX)
    }

    pub(crate) fn select(&mut self, index: usize) {
        if index >= self.state.results.len() {
            return;
        }
        self.state.selected_index = index;
        self.send_update(LauncherUpdate::Selection { index });
    }

    fn focus_results(&mut self, index: usize) {
        self.select(index);
        self.set_focus(FocusMode::Results);
    }

    fn focus_header(&mut self, index: usize) {
        self.state.header_button_index = index;
        self.set_focus(FocusMode::Header);
    }

    pub(crate) fn set_focus(&mut self, mode: FocusMode) {
        self.state.focus_mode = mode;
        self.send_update(LauncherUpdate::Focus {
            mode,
            header_index: self.state.header_button_index,
        });
    }
}
