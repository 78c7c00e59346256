//! The host application as seen from a running story.
//!
//! Built-in functions that reach outside the engine (playing sounds, opening
//! menus, saving sessions, asking the player for input) go through [`Book`].
//! Every method has a do-nothing default, so a host only implements what it
//! supports.

use folio_session::Session;

/// Callbacks from the engine into the host.
pub trait Book {
    /// An asset was switched on.
    fn play(&mut self, _asset: &str) {}

    /// An asset was switched off.
    fn stop(&mut self, _asset: &str) {}

    /// Let the player pick one of `options`. Returns the chosen index.
    fn select_value(&mut self, options: &[String]) -> Option<usize> {
        (!options.is_empty()).then_some(0)
    }

    /// Open the named menu.
    fn open_menu(&mut self, _name: &str) {}

    /// Close the open menu.
    fn close_menu(&mut self) {}

    /// Open another book. Returns whether it was found.
    fn open_book(&mut self, _name: &str) -> bool {
        false
    }

    /// Close the current book.
    fn close_book(&mut self) {}

    /// Leave the application.
    fn quit(&mut self) {}

    /// Titles of the books the host can open.
    fn books(&self) -> Vec<String> {
        Vec::new()
    }

    /// Whether a play-through is running, as opposed to a title screen.
    fn is_in_game(&self) -> bool {
        true
    }

    /// Names of stored sessions.
    fn sessions(&self) -> Vec<String> {
        Vec::new()
    }

    /// Store `session` under its name. Returns whether it was written.
    fn save_session(&mut self, _session: &Session) -> bool {
        false
    }

    /// Read a stored session.
    fn load_session(&mut self, _name: &str) -> Option<Session> {
        None
    }

    /// Show a message the player must acknowledge. Returns the answer.
    fn dialog(&mut self, _message: &str) -> bool {
        true
    }

    /// Ask the player for a line of text.
    fn input(&mut self, _prompt: &str) -> Option<String> {
        None
    }
}

/// A book that ignores every callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBook;

impl Book for NullBook {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pick_first_option() {
        let mut book = NullBook;
        assert_eq!(book.select_value(&["a".into(), "b".into()]), Some(0));
        assert_eq!(book.select_value(&[]), None);
        assert!(book.load_session("x").is_none());
        assert!(!book.save_session(&Session::default()));
    }
}
