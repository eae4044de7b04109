//! Hotkey string parsing (`Mod+Mod+Key`), used by shells for profile
//! activation. Not consulted by `Engine::process_key`.

use crate::virtual_key::VirtualKey;

/// A parsed hotkey: modifier flags plus the single triggering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hotkey {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
    pub key_code: VirtualKey,
}

/// Parses hotkey strings of the form `Mod+Mod+Key` (case-insensitive,
/// `+` or space as separator).
pub struct HotkeyParser;

impl HotkeyParser {
    /// Parse a hotkey string. Fails if zero or more than one non-modifier
    /// token is given, or if an unknown token appears.
    pub fn parse(spec: &str) -> Option<Hotkey> {
        let mut ctrl = false;
        let mut alt = false;
        let mut shift = false;
        let mut meta = false;
        let mut key: Option<VirtualKey> = None;

        for token in tokenize(spec) {
            let upper = token.to_ascii_uppercase();
            match upper.as_str() {
                "CTRL" | "CONTROL" => ctrl = true,
                "ALT" | "OPTION" => alt = true,
                "SHIFT" => shift = true,
                "META" | "CMD" | "COMMAND" | "WIN" | "SUPER" => meta = true,
                _ => {
                    if key.is_some() {
                        // More than one non-modifier key: invalid hotkey.
                        return None;
                    }
                    key = Some(parse_key(&upper)?);
                }
            }
        }

        key.map(|key_code| Hotkey {
            ctrl,
            alt,
            shift,
            meta,
            key_code,
        })
    }
}

fn tokenize(spec: &str) -> impl Iterator<Item = &str> {
    spec.split(|c: char| c == '+' || c.is_whitespace())
        .filter(|s| !s.is_empty())
}

fn parse_key(upper: &str) -> Option<VirtualKey> {
    use VirtualKey::*;

    if upper.len() == 1 {
        let c = upper.chars().next().unwrap();
        if c.is_ascii_digit() {
            return digit_key(c);
        }
        if c.is_ascii_alphabetic() {
            return letter_key(c);
        }
        return punctuation_key(c);
    }

    let named = match upper {
        "SPACE" => Space,
        "ENTER" | "RETURN" => Return,
        "TAB" => Tab,
        "BACKSPACE" | "BACK" => Back,
        "DELETE" | "DEL" => Delete,
        "ESCAPE" | "ESC" => Escape,
        "INSERT" | "INS" => Insert,
        "HOME" => Home,
        "END" => End,
        "PAGEUP" | "PGUP" | "PRIOR" => Prior,
        "PAGEDOWN" | "PGDN" | "NEXT" => Next,
        "LEFT" => Left,
        "RIGHT" => Right,
        "UP" => Up,
        "DOWN" => Down,
        "PLUS" => OemPlus,
        "MINUS" => OemMinus,
        "F1" => F1,
        "F2" => F2,
        "F3" => F3,
        "F4" => F4,
        "F5" => F5,
        "F6" => F6,
        "F7" => F7,
        "F8" => F8,
        "F9" => F9,
        "F10" => F10,
        "F11" => F11,
        "F12" => F12,
        "NUMPAD0" => Numpad0,
        "NUMPAD1" => Numpad1,
        "NUMPAD2" => Numpad2,
        "NUMPAD3" => Numpad3,
        "NUMPAD4" => Numpad4,
        "NUMPAD5" => Numpad5,
        "NUMPAD6" => Numpad6,
        "NUMPAD7" => Numpad7,
        "NUMPAD8" => Numpad8,
        "NUMPAD9" => Numpad9,
        _ => return None,
    };
    Some(named)
}

fn digit_key(c: char) -> Option<VirtualKey> {
    use VirtualKey::*;
    Some(match c {
        '0' => Key0,
        '1' => Key1,
        '2' => Key2,
        '3' => Key3,
        '4' => Key4,
        '5' => Key5,
        '6' => Key6,
        '7' => Key7,
        '8' => Key8,
        '9' => Key9,
        _ => return None,
    })
}

fn letter_key(c: char) -> Option<VirtualKey> {
    use VirtualKey::*;
    Some(match c {
        'A' => KeyA,
        'B' => KeyB,
        'C' => KeyC,
        'D' => KeyD,
        'E' => KeyE,
        'F' => KeyF,
        'G' => KeyG,
        'H' => KeyH,
        'I' => KeyI,
        'J' => KeyJ,
        'K' => KeyK,
        'L' => KeyL,
        'M' => KeyM,
        'N' => KeyN,
        'O' => KeyO,
        'P' => KeyP,
        'Q' => KeyQ,
        'R' => KeyR,
        'S' => KeyS,
        'T' => KeyT,
        'U' => KeyU,
        'V' => KeyV,
        'W' => KeyW,
        'X' => KeyX,
        'Y' => KeyY,
        'Z' => KeyZ,
        _ => return None,
    })
}

fn punctuation_key(c: char) -> Option<VirtualKey> {
    use VirtualKey::*;
    Some(match c {
        '=' => OemPlus,
        '-' => OemMinus,
        ',' => OemComma,
        '.' => OemPeriod,
        ';' => Oem1,
        '/' => Oem2,
        '`' => Oem3,
        '[' => Oem4,
        '\\' => Oem5,
        ']' => Oem6,
        '\'' => Oem7,
        _ => return None,
    })
}
