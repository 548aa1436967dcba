use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    // Navigation
    NextPanel, // Tab - Next panel
    PrevPanel, // Shift+Tab - Previous panel
    NextItem,  // Down arrow, j
    PrevItem,  // Up arrow, k
    NextPage,  // Right arrow, l - next history page
    PrevPage,  // Left arrow, h - previous history page

    // Settings
    ShowHelp,       // F2 or '?' - Toggle help overlay
    SaveSettings,   // F5 - Save current settings
    ReloadSettings, // F6 - Reload settings from config

    // Control
    Quit,    // 'q', Esc or Ctrl+C
    Refresh, // 'r' - Force an immediate fetch of every widget
    Pause,   // Space - Pause/resume polling

    // Config adjustments
    IncreaseRefresh, // '>' - Increase refresh rate (decrease interval)
    DecreaseRefresh, // '<' - Decrease refresh rate (increase interval)

    // Unknown/unhandled
    Unknown,
}

impl InputEvent {
    pub fn from_key_event(key_event: KeyEvent) -> Self {
        match (key_event.code, key_event.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Self::Quit,

            (KeyCode::Tab, KeyModifiers::NONE) => Self::NextPanel,
            (KeyCode::Tab, KeyModifiers::SHIFT) => Self::PrevPanel,
            (KeyCode::BackTab, _) => Self::PrevPanel,

            (KeyCode::Down | KeyCode::Char('j'), _) => Self::NextItem,
            (KeyCode::Up | KeyCode::Char('k'), _) => Self::PrevItem,
            (KeyCode::Right | KeyCode::Char('l'), _) => Self::NextPage,
            (KeyCode::Left | KeyCode::Char('h'), _) => Self::PrevPage,

            (KeyCode::F(2) | KeyCode::Char('?'), _) => Self::ShowHelp,
            (KeyCode::F(5), _) => Self::SaveSettings,
            (KeyCode::F(6), _) => Self::ReloadSettings,

            (KeyCode::Char('q'), _) => Self::Quit,
            (KeyCode::Char('r'), _) => Self::Refresh,
            (KeyCode::Char(' '), _) => Self::Pause,
            (KeyCode::Char('>'), _) => Self::IncreaseRefresh,
            (KeyCode::Char('<'), _) => Self::DecreaseRefresh,

            (KeyCode::Esc, _) => Self::Quit,

            _ => Self::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_navigation_keys() {
        let tab = KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE);
        assert_eq!(InputEvent::from_key_event(tab), InputEvent::NextPanel);

        let right = KeyEvent::new(KeyCode::Right, KeyModifiers::NONE);
        assert_eq!(InputEvent::from_key_event(right), InputEvent::NextPage);
    }

    #[test]
    fn ctrl_c_quits() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(InputEvent::from_key_event(ctrl_c), InputEvent::Quit);
    }
}
