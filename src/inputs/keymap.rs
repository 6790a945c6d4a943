use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    SwitchView,
    LineDown,
    LineUp,
    PageDown,
    PageUp,
    Home,
    End,
    Digit(u8),
    Help,
    Edit,
    Images,
}

pub fn action_for(key: &KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Action::Quit),
            KeyCode::Char('f') => Some(Action::PageDown),
            KeyCode::Char('b') => Some(Action::PageUp),
            _ => None,
        };
    }

    let action = match key.code {
        KeyCode::Esc | KeyCode::Char('q') => Action::Quit,
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Left | KeyCode::Right => Action::SwitchView,
        KeyCode::Down | KeyCode::Char('j') => Action::LineDown,
        KeyCode::Up | KeyCode::Char('k') => Action::LineUp,
        KeyCode::PageDown | KeyCode::Char('J') | KeyCode::Char(' ') => Action::PageDown,
        KeyCode::PageUp | KeyCode::Char('K') => Action::PageUp,
        KeyCode::Home | KeyCode::Char('H') => Action::Home,
        KeyCode::End | KeyCode::Char('L') => Action::End,
        KeyCode::Char('h') | KeyCode::Char('?') => Action::Help,
        KeyCode::Char('e') => Action::Edit,
        KeyCode::Char('i') => Action::Images,
        KeyCode::Char(c) if c.is_ascii_digit() => Action::Digit(c as u8 - b'0'),
        _ => return None,
    };
    Some(action)
}

pub const HELP_TEXT: &str = "\
Keys:
  Esc / q             quit
  Tab / Left / Right  switch between contents and chapter
  Down / j            down a line
  Up / k              up a line
  PgDn / J / Space    down a page
  PgUp / K            up a page
  Home / H            first entry / top of chapter
  End / L             last entry / end of chapter
  0-9                 jump to chapter (contents view)
  e                   open chapter source in $EDITOR (chapter view)
  i                   view images on the page (chapter view)
  h / ?               this help

Press any key to continue.";

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn vim_and_arrow_keys_share_actions() {
        assert_eq!(action_for(&key(KeyCode::Char('j'))), Some(Action::LineDown));
        assert_eq!(action_for(&key(KeyCode::Down)), Some(Action::LineDown));
        assert_eq!(
            action_for(&KeyEvent::new(KeyCode::Char('J'), KeyModifiers::SHIFT)),
            Some(Action::PageDown)
        );
        assert_eq!(action_for(&key(KeyCode::Left)), Some(Action::SwitchView));
    }

    #[test]
    fn digits_and_control_keys() {
        assert_eq!(action_for(&key(KeyCode::Char('7'))), Some(Action::Digit(7)));
        assert_eq!(
            action_for(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Action::Quit)
        );
        assert_eq!(action_for(&key(KeyCode::Char('x'))), None);
    }
}
