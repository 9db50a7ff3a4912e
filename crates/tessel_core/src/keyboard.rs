//! Keyboard input understood by the selection widgets

/// Keys the widgets react to; everything else arrives as `Other` and is ignored
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Home,
    End,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Enter,
    Space,
    Escape,
    Tab,
    Other(char),
}

impl Key {
    /// Parse a DOM `KeyboardEvent.key` string
    pub fn from_dom(key: &str) -> Key {
        match key {
            "Home" => Key::Home,
            "End" => Key::End,
            "ArrowUp" | "Up" => Key::ArrowUp,
            "ArrowDown" | "Down" => Key::ArrowDown,
            "ArrowLeft" | "Left" => Key::ArrowLeft,
            "ArrowRight" | "Right" => Key::ArrowRight,
            "Enter" => Key::Enter,
            " " | "Spacebar" => Key::Space,
            "Escape" | "Esc" => Key::Escape,
            "Tab" => Key::Tab,
            other => Key::Other(other.chars().next().unwrap_or('\0')),
        }
    }

    /// Keys that activate (toggle) the active element
    pub fn is_activation(self) -> bool {
        matches!(self, Key::Enter | Key::Space)
    }
}
