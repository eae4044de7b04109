//! Internal key identifiers and OS-code lookup tables.
//!
//! KM2 `PREDEFINED` opcodes carry these numeric values literally, so they
//! are stable and must not be renumbered. Grounded in
//! `keymagic-core-cpp/include/keymagic/virtual_keys.h`.

/// A closed enum of internal key identifiers. Numeric values match the
/// codes compiled into circulating KM2 files; do not renumber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum VirtualKey {
    /// NULL output marker — clears accumulated RHS output.
    Null = 1,
    Back = 2,
    Tab = 3,
    Return = 4,
    Shift = 5,
    Control = 6,
    Menu = 7,
    Pause = 8,
    Capital = 9,
    Kanji = 10,
    Escape = 11,
    Space = 12,
    Prior = 13,
    Next = 14,
    Delete = 15,
    Key0 = 16,
    Key1 = 17,
    Key2 = 18,
    Key3 = 19,
    Key4 = 20,
    Key5 = 21,
    Key6 = 22,
    Key7 = 23,
    Key8 = 24,
    Key9 = 25,
    KeyA = 26,
    KeyB = 27,
    KeyC = 28,
    KeyD = 29,
    KeyE = 30,
    KeyF = 31,
    KeyG = 32,
    KeyH = 33,
    KeyI = 34,
    KeyJ = 35,
    KeyK = 36,
    KeyL = 37,
    KeyM = 38,
    KeyN = 39,
    KeyO = 40,
    KeyP = 41,
    KeyQ = 42,
    KeyR = 43,
    KeyS = 44,
    KeyT = 45,
    KeyU = 46,
    KeyV = 47,
    KeyW = 48,
    KeyX = 49,
    KeyY = 50,
    KeyZ = 51,
    Numpad0 = 52,
    Numpad1 = 53,
    Numpad2 = 54,
    Numpad3 = 55,
    Numpad4 = 56,
    Numpad5 = 57,
    Numpad6 = 58,
    Numpad7 = 59,
    Numpad8 = 60,
    Numpad9 = 61,
    Multiply = 62,
    Add = 63,
    Separator = 64,
    Subtract = 65,
    Decimal = 66,
    Divide = 67,
    F1 = 68,
    F2 = 69,
    F3 = 70,
    F4 = 71,
    F5 = 72,
    F6 = 73,
    F7 = 74,
    F8 = 75,
    F9 = 76,
    F10 = 77,
    F11 = 78,
    F12 = 79,
    LShift = 80,
    RShift = 81,
    LControl = 82,
    RControl = 83,
    LMenu = 84,
    RMenu = 85,
    Oem1 = 86,
    OemPlus = 87,
    OemComma = 88,
    OemMinus = 89,
    OemPeriod = 90,
    Oem2 = 91,
    Oem3 = 92,
    Oem4 = 93,
    Oem5 = 94,
    Oem6 = 95,
    Oem7 = 96,
    Oem8 = 97,
    OemAx = 98,
    Oem102 = 99,
    IcoHelp = 100,
    Ico00 = 101,
    End = 102,
    Home = 103,
    Left = 104,
    Up = 105,
    Right = 106,
    Down = 107,
    Insert = 108,
    CapsLock = 109,
    Cflex = 110,
    Colon = 111,
    Quote = 112,
    BackSlash = 113,
    OpenSquareBracket = 114,
    CloseSquareBracket = 115,
    BackQuote = 116,
    ForwardSlash = 117,
    Enter = 118,
    Ctrl = 119,
    Alt = 120,
    Esc = 121,
    AltGr = 122,
}

impl VirtualKey {
    /// Highest valid numeric value.
    pub const MAX_VALUE: u16 = 122;

    /// Look up a `VirtualKey` by its numeric KM2 code.
    pub fn from_code(code: u16) -> Option<Self> {
        if code == 0 || code > Self::MAX_VALUE {
            return None;
        }
        // SAFETY-free: match every discriminant explicitly rather than
        // transmuting, so adding variants can't silently desync this table.
        use VirtualKey::*;
        Some(match code {
            1 => Null,
            2 => Back,
            3 => Tab,
            4 => Return,
            5 => Shift,
            6 => Control,
            7 => Menu,
            8 => Pause,
            9 => Capital,
            10 => Kanji,
            11 => Escape,
            12 => Space,
            13 => Prior,
            14 => Next,
            15 => Delete,
            16 => Key0,
            17 => Key1,
            18 => Key2,
            19 => Key3,
            20 => Key4,
            21 => Key5,
            22 => Key6,
            23 => Key7,
            24 => Key8,
            25 => Key9,
            26 => KeyA,
            27 => KeyB,
            28 => KeyC,
            29 => KeyD,
            30 => KeyE,
            31 => KeyF,
            32 => KeyG,
            33 => KeyH,
            34 => KeyI,
            35 => KeyJ,
            36 => KeyK,
            37 => KeyL,
            38 => KeyM,
            39 => KeyN,
            40 => KeyO,
            41 => KeyP,
            42 => KeyQ,
            43 => KeyR,
            44 => KeyS,
            45 => KeyT,
            46 => KeyU,
            47 => KeyV,
            48 => KeyW,
            49 => KeyX,
            50 => KeyY,
            51 => KeyZ,
            52 => Numpad0,
            53 => Numpad1,
            54 => Numpad2,
            55 => Numpad3,
            56 => Numpad4,
            57 => Numpad5,
            58 => Numpad6,
            59 => Numpad7,
            60 => Numpad8,
            61 => Numpad9,
            62 => Multiply,
            63 => Add,
            64 => Separator,
            65 => Subtract,
            66 => Decimal,
            67 => Divide,
            68 => F1,
            69 => F2,
            70 => F3,
            71 => F4,
            72 => F5,
            73 => F6,
            74 => F7,
            75 => F8,
            76 => F9,
            77 => F10,
            78 => F11,
            79 => F12,
            80 => LShift,
            81 => RShift,
            82 => LControl,
            83 => RControl,
            84 => LMenu,
            85 => RMenu,
            86 => Oem1,
            87 => OemPlus,
            88 => OemComma,
            89 => OemMinus,
            90 => OemPeriod,
            91 => Oem2,
            92 => Oem3,
            93 => Oem4,
            94 => Oem5,
            95 => Oem6,
            96 => Oem7,
            97 => Oem8,
            98 => OemAx,
            99 => Oem102,
            100 => IcoHelp,
            101 => Ico00,
            102 => End,
            103 => Home,
            104 => Left,
            105 => Up,
            106 => Right,
            107 => Down,
            108 => Insert,
            109 => CapsLock,
            110 => Cflex,
            111 => Colon,
            112 => Quote,
            113 => BackSlash,
            114 => OpenSquareBracket,
            115 => CloseSquareBracket,
            116 => BackQuote,
            117 => ForwardSlash,
            118 => Enter,
            119 => Ctrl,
            120 => Alt,
            121 => Esc,
            122 => AltGr,
            _ => return None,
        })
    }

    /// `true` for keys that represent a modifier (including left/right
    /// variants and the generic aliases).
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            VirtualKey::Shift
                | VirtualKey::Control
                | VirtualKey::Menu
                | VirtualKey::LShift
                | VirtualKey::RShift
                | VirtualKey::LControl
                | VirtualKey::RControl
                | VirtualKey::LMenu
                | VirtualKey::RMenu
                | VirtualKey::Ctrl
                | VirtualKey::Alt
                | VirtualKey::AltGr
        )
    }

    /// `true` for A-Z.
    pub fn is_letter(self) -> bool {
        (Self::KeyA as u16..=Self::KeyZ as u16).contains(&(self as u16))
    }

    /// `true` for 0-9.
    pub fn is_number(self) -> bool {
        (Self::Key0 as u16..=Self::Key9 as u16).contains(&(self as u16))
    }
}

/// Modifier flags accompanying a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub caps_lock: bool,
    pub meta: bool,
}

/// A platform-independent key code lookup table: maps a host platform's own
/// key-code space to/from `VirtualKey`. Shells own the concrete table (e.g.
/// Windows VK codes, X11 keysyms); this is the shape they populate.
#[derive(Debug, Clone, Default)]
pub struct KeyCodeMap {
    to_virtual: std::collections::HashMap<u32, VirtualKey>,
    from_virtual: std::collections::HashMap<u16, u32>,
}

impl KeyCodeMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bidirectional mapping between a platform code and a
    /// `VirtualKey`.
    pub fn insert(&mut self, platform_code: u32, key: VirtualKey) {
        self.to_virtual.insert(platform_code, key);
        self.from_virtual.insert(key as u16, platform_code);
    }

    /// Translate a platform key code into a `VirtualKey`.
    pub fn to_virtual_key(&self, platform_code: u32) -> Option<VirtualKey> {
        self.to_virtual.get(&platform_code).copied()
    }

    /// Translate a `VirtualKey` into this platform's key code.
    pub fn to_platform_code(&self, key: VirtualKey) -> Option<u32> {
        self.from_virtual.get(&(key as u16)).copied()
    }
}
