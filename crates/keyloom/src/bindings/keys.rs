//! Key values, modifier sets, and the canonical [`KeySpec`] binding key.
//!
//! Keyvals use the X11 keysym numbering (the same numbers every major
//! toolkit reports), and modifier bits use the X11/GDK layout so raw event
//! state can be passed straight through.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    /// Modifier state of a key event.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ModifierType: u32 {
        const SHIFT = 1 << 0;
        const LOCK = 1 << 1;
        const CONTROL = 1 << 2;
        /// Usually Alt.
        const MOD1 = 1 << 3;
        /// Usually NumLock.
        const MOD2 = 1 << 4;
        /// Usually Hyper when set without `HYPER`.
        const MOD3 = 1 << 5;
        /// Usually Super when set without `SUPER`.
        const MOD4 = 1 << 6;
        const MOD5 = 1 << 7;
        const SUPER = 1 << 26;
        const HYPER = 1 << 27;
        const META = 1 << 28;
        /// Set on key-release events.
        const RELEASE = 1 << 30;
    }
}

impl ModifierType {
    /// Alias for [`ModifierType::MOD1`].
    pub const ALT: Self = Self::MOD1;

    /// Modifiers that participate in binding lookup.
    ///
    /// Lock and the remaining numbered modifiers are stripped before a key
    /// is matched, so bindings fire regardless of CapsLock or NumLock.
    pub const BINDING_MASK: Self = Self::SHIFT
        .union(Self::CONTROL)
        .union(Self::MOD1)
        .union(Self::SUPER)
        .union(Self::HYPER)
        .union(Self::META)
        .union(Self::RELEASE);

    /// Map the numbered Super and Hyper bits onto their virtual bits.
    pub fn resolve_virtual(self) -> Self {
        let mut resolved = self;
        if self.contains(Self::MOD4) {
            resolved.remove(Self::MOD4);
            resolved.insert(Self::SUPER);
        }
        if self.contains(Self::MOD3) {
            resolved.remove(Self::MOD3);
            resolved.insert(Self::HYPER);
        }
        resolved
    }

    /// Canonical form used for matching.
    pub fn canonical(self) -> Self {
        self.resolve_virtual() & Self::BINDING_MASK
    }
}

/// X11 keysym values used by the built-in bindings.
pub mod keyval {
    pub const SPACE: u32 = 0x020;
    pub const BACKSPACE: u32 = 0xff08;
    pub const TAB: u32 = 0xff09;
    pub const RETURN: u32 = 0xff0d;
    pub const ESCAPE: u32 = 0xff1b;
    pub const DELETE: u32 = 0xffff;
    pub const INSERT: u32 = 0xff63;
    pub const ISO_LEFT_TAB: u32 = 0xfe20;
    pub const ISO_ENTER: u32 = 0xfe34;
    pub const HOME: u32 = 0xff50;
    pub const LEFT: u32 = 0xff51;
    pub const UP: u32 = 0xff52;
    pub const RIGHT: u32 = 0xff53;
    pub const DOWN: u32 = 0xff54;
    pub const PAGE_UP: u32 = 0xff55;
    pub const PAGE_DOWN: u32 = 0xff56;
    pub const END: u32 = 0xff57;
    pub const MENU: u32 = 0xff67;
    pub const KP_SPACE: u32 = 0xff80;
    pub const KP_TAB: u32 = 0xff89;
    pub const KP_ENTER: u32 = 0xff8d;
    pub const KP_HOME: u32 = 0xff95;
    pub const KP_LEFT: u32 = 0xff96;
    pub const KP_UP: u32 = 0xff97;
    pub const KP_RIGHT: u32 = 0xff98;
    pub const KP_DOWN: u32 = 0xff99;
    pub const KP_PAGE_UP: u32 = 0xff9a;
    pub const KP_PAGE_DOWN: u32 = 0xff9b;
    pub const KP_END: u32 = 0xff9c;
    pub const F1: u32 = 0xffbe;
    pub const F2: u32 = 0xffbf;
    pub const F3: u32 = 0xffc0;
    pub const F4: u32 = 0xffc1;
    pub const F5: u32 = 0xffc2;
    pub const F6: u32 = 0xffc3;
    pub const F7: u32 = 0xffc4;
    pub const F8: u32 = 0xffc5;
    pub const F9: u32 = 0xffc6;
    pub const F10: u32 = 0xffc7;
    pub const F11: u32 = 0xffc8;
    pub const F12: u32 = 0xffc9;
}

const NAMED_KEYS: &[(&str, u32)] = &[
    ("space", keyval::SPACE),
    ("BackSpace", keyval::BACKSPACE),
    ("Tab", keyval::TAB),
    ("Return", keyval::RETURN),
    ("Escape", keyval::ESCAPE),
    ("Delete", keyval::DELETE),
    ("Insert", keyval::INSERT),
    ("ISO_Left_Tab", keyval::ISO_LEFT_TAB),
    ("ISO_Enter", keyval::ISO_ENTER),
    ("Home", keyval::HOME),
    ("Left", keyval::LEFT),
    ("Up", keyval::UP),
    ("Right", keyval::RIGHT),
    ("Down", keyval::DOWN),
    ("Page_Up", keyval::PAGE_UP),
    ("Prior", keyval::PAGE_UP),
    ("Page_Down", keyval::PAGE_DOWN),
    ("Next", keyval::PAGE_DOWN),
    ("End", keyval::END),
    ("Menu", keyval::MENU),
    ("KP_Space", keyval::KP_SPACE),
    ("KP_Tab", keyval::KP_TAB),
    ("KP_Enter", keyval::KP_ENTER),
    ("KP_Home", keyval::KP_HOME),
    ("KP_Left", keyval::KP_LEFT),
    ("KP_Up", keyval::KP_UP),
    ("KP_Right", keyval::KP_RIGHT),
    ("KP_Down", keyval::KP_DOWN),
    ("KP_Page_Up", keyval::KP_PAGE_UP),
    ("KP_Prior", keyval::KP_PAGE_UP),
    ("KP_Page_Down", keyval::KP_PAGE_DOWN),
    ("KP_Next", keyval::KP_PAGE_DOWN),
    ("KP_End", keyval::KP_END),
    ("exclam", 0x21),
    ("quotedbl", 0x22),
    ("numbersign", 0x23),
    ("dollar", 0x24),
    ("percent", 0x25),
    ("ampersand", 0x26),
    ("apostrophe", 0x27),
    ("parenleft", 0x28),
    ("parenright", 0x29),
    ("asterisk", 0x2a),
    ("plus", 0x2b),
    ("comma", 0x2c),
    ("minus", 0x2d),
    ("period", 0x2e),
    ("slash", 0x2f),
    ("colon", 0x3a),
    ("semicolon", 0x3b),
    ("less", 0x3c),
    ("equal", 0x3d),
    ("greater", 0x3e),
    ("question", 0x3f),
    ("at", 0x40),
    ("bracketleft", 0x5b),
    ("backslash", 0x5c),
    ("bracketright", 0x5d),
    ("asciicircum", 0x5e),
    ("underscore", 0x5f),
    ("grave", 0x60),
    ("braceleft", 0x7b),
    ("bar", 0x7c),
    ("braceright", 0x7d),
    ("asciitilde", 0x7e),
];

/// Look up a keyval by its keysym name (`"Tab"`, `"F6"`, `"a"`, `"comma"`).
///
/// The `0x....` form written by [`keyval_name`] for unnamed keyvals is
/// accepted too. Returns `None` for unknown names.
pub fn keyval_from_name(name: &str) -> Option<u32> {
    if let Some(&(_, value)) = NAMED_KEYS.iter().find(|(n, _)| *n == name) {
        return Some(value);
    }
    // F1..F35 are contiguous.
    if let Some(n) = name.strip_prefix('F').and_then(|n| n.parse::<u32>().ok())
        && (1..=35).contains(&n)
    {
        return Some(keyval::F1 + n - 1);
    }
    // Unnamed keyvals, as written by `keyval_name`.
    if let Some(hex) = name.strip_prefix("0x")
        && !hex.is_empty()
    {
        return u32::from_str_radix(hex, 16).ok();
    }
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphanumeric() => Some(c as u32),
        _ => None,
    }
}

/// The keysym name of a keyval.
///
/// Printable ASCII letters and digits map to themselves; keyvals without a
/// known name format as `0x....`.
pub fn keyval_name(value: u32) -> String {
    if let Some(&(name, _)) = NAMED_KEYS.iter().find(|(_, v)| *v == value) {
        return name.to_string();
    }
    if (keyval::F1..keyval::F1 + 35).contains(&value) {
        return format!("F{}", value - keyval::F1 + 1);
    }
    match char::from_u32(value) {
        Some(c) if c.is_ascii_alphanumeric() => c.to_string(),
        _ => format!("{value:#06x}"),
    }
}

/// Convert a keyval to its lower-case form.
///
/// Covers ASCII and the Latin-1 letters that keysyms share with Unicode.
pub fn keyval_to_lower(value: u32) -> u32 {
    match value {
        0x41..=0x5a => value + 0x20,
        0xc0..=0xde if value != 0xd7 => value + 0x20,
        _ => value,
    }
}

/// A canonical (keyval, modifiers) pair used as a binding key.
///
/// Construction lowers the keyval, resolves the Super/Hyper aliases, masks
/// the modifiers to [`ModifierType::BINDING_MASK`], and reads `ISO_Left_Tab`
/// as Shift+Tab. Two specs are equal exactly when their canonical forms are.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeySpec {
    keyval: u32,
    modifiers: ModifierType,
}

impl KeySpec {
    /// Build a canonical key from a keyval and a typed modifier set.
    pub fn new(keyval: u32, modifiers: ModifierType) -> Self {
        let mut modifiers = modifiers.canonical();
        let keyval = match keyval {
            keyval::ISO_LEFT_TAB => {
                modifiers.insert(ModifierType::SHIFT);
                keyval::TAB
            }
            other => keyval_to_lower(other),
        };
        Self { keyval, modifiers }
    }

    /// Build a canonical key from raw event state; unknown bits are dropped.
    pub fn from_raw(keyval: u32, raw_modifiers: u32) -> Self {
        Self::new(keyval, ModifierType::from_bits_truncate(raw_modifiers))
    }

    pub fn keyval(&self) -> u32 {
        self.keyval
    }

    pub fn modifiers(&self) -> ModifierType {
        self.modifiers
    }

    /// Whether this key matches release events.
    pub fn is_release(&self) -> bool {
        self.modifiers.contains(ModifierType::RELEASE)
    }

    /// Parse an accelerator string such as `"<Control><Shift>F6"`.
    ///
    /// Modifier names are case-insensitive. Returns `None` if a modifier or
    /// the key name is not recognized.
    pub fn parse_accelerator(accelerator: &str) -> Option<Self> {
        let mut rest = accelerator.trim();
        let mut modifiers = ModifierType::empty();
        while let Some(tail) = rest.strip_prefix('<') {
            let end = tail.find('>')?;
            modifiers |= modifier_from_name(&tail[..end])?;
            rest = &tail[end + 1..];
        }
        let keyval = keyval_from_name(rest)?;
        Some(Self::new(keyval, modifiers))
    }

    /// Format as an accelerator string that [`parse_accelerator`](Self::parse_accelerator) accepts.
    pub fn accelerator_name(&self) -> String {
        let mut out = String::new();
        for (flag, name) in MODIFIER_NAMES {
            if self.modifiers.contains(*flag) {
                out.push('<');
                out.push_str(name);
                out.push('>');
            }
        }
        out.push_str(&keyval_name(self.keyval));
        out
    }
}

impl fmt::Display for KeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.accelerator_name())
    }
}

impl Serialize for KeySpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.accelerator_name())
    }
}

impl<'de> Deserialize<'de> for KeySpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        KeySpec::parse_accelerator(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid accelerator '{s}'")))
    }
}

/// Canonical names used when formatting, in output order.
const MODIFIER_NAMES: &[(ModifierType, &str)] = &[
    (ModifierType::RELEASE, "Release"),
    (ModifierType::SHIFT, "Shift"),
    (ModifierType::CONTROL, "Control"),
    (ModifierType::MOD1, "Alt"),
    (ModifierType::SUPER, "Super"),
    (ModifierType::HYPER, "Hyper"),
    (ModifierType::META, "Meta"),
];

fn modifier_from_name(name: &str) -> Option<ModifierType> {
    let modifier = match name.to_ascii_lowercase().as_str() {
        "shift" | "shft" => ModifierType::SHIFT,
        "control" | "ctrl" | "ctl" | "primary" => ModifierType::CONTROL,
        "alt" | "mod1" => ModifierType::MOD1,
        "mod2" => ModifierType::MOD2,
        "mod3" => ModifierType::MOD3,
        "mod4" => ModifierType::MOD4,
        "mod5" => ModifierType::MOD5,
        "lock" => ModifierType::LOCK,
        "super" => ModifierType::SUPER,
        "hyper" => ModifierType::HYPER,
        "meta" => ModifierType::META,
        "release" => ModifierType::RELEASE,
        _ => return None,
    };
    Some(modifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyval_lowering() {
        let upper = KeySpec::new('A' as u32, ModifierType::SHIFT);
        let lower = KeySpec::new('a' as u32, ModifierType::SHIFT);
        assert_eq!(upper, lower);
        assert_eq!(upper.keyval(), 'a' as u32);
        assert_eq!(keyval_to_lower(0xc9), 0xe9);
        assert_eq!(keyval_to_lower(0xd7), 0xd7);
    }

    #[test]
    fn test_lock_and_numlock_are_masked() {
        let plain = KeySpec::new(keyval::F6, ModifierType::empty());
        let locked = KeySpec::new(keyval::F6, ModifierType::LOCK | ModifierType::MOD2);
        assert_eq!(plain, locked);
    }

    #[test]
    fn test_virtual_modifier_resolution() {
        let mod4 = KeySpec::new(keyval::F1, ModifierType::MOD4);
        let sup = KeySpec::new(keyval::F1, ModifierType::SUPER);
        assert_eq!(mod4, sup);
        assert_eq!(KeySpec::new(keyval::F1, ModifierType::ALT), KeySpec::new(keyval::F1, ModifierType::MOD1));
    }

    #[test]
    fn test_out_of_range_bits_dropped() {
        let raw = KeySpec::from_raw(keyval::TAB, (1 << 2) | (1 << 13) | (1 << 31));
        assert_eq!(raw.modifiers(), ModifierType::CONTROL);
    }

    #[test]
    fn test_iso_left_tab_is_shift_tab() {
        let iso = KeySpec::new(keyval::ISO_LEFT_TAB, ModifierType::empty());
        assert_eq!(iso, KeySpec::new(keyval::TAB, ModifierType::SHIFT));
    }

    #[test]
    fn test_release_is_distinct() {
        let press = KeySpec::new(keyval::F1, ModifierType::empty());
        let release = KeySpec::new(keyval::F1, ModifierType::RELEASE);
        assert_ne!(press, release);
        assert!(release.is_release());
    }

    #[test]
    fn test_parse_accelerator() {
        let key = KeySpec::parse_accelerator("<Ctrl><shft>F6").unwrap();
        assert_eq!(key.keyval(), keyval::F6);
        assert_eq!(key.modifiers(), ModifierType::CONTROL | ModifierType::SHIFT);

        let key = KeySpec::parse_accelerator("<Alt>Page_Down").unwrap();
        assert_eq!(key.modifiers(), ModifierType::MOD1);
        assert_eq!(key.keyval(), keyval::PAGE_DOWN);

        assert!(KeySpec::parse_accelerator("<Bogus>F1").is_none());
        assert!(KeySpec::parse_accelerator("<Control>NoSuchKey").is_none());
        assert!(KeySpec::parse_accelerator("<Control F1").is_none());
    }

    #[test]
    fn test_accelerator_name_round_trip() {
        for accel in ["<Shift><Control>F8", "Escape", "<Release>space", "<Alt>x", "KP_Enter"] {
            let key = KeySpec::parse_accelerator(accel).unwrap();
            assert_eq!(KeySpec::parse_accelerator(&key.accelerator_name()), Some(key));
        }
        assert_eq!(
            KeySpec::new(keyval::F8, ModifierType::SHIFT | ModifierType::CONTROL).to_string(),
            "<Shift><Control>F8"
        );
    }

    #[test]
    fn test_keyval_names() {
        assert_eq!(keyval_from_name("F12"), Some(keyval::F12));
        assert_eq!(keyval_from_name("KP_Tab"), Some(keyval::KP_TAB));
        assert_eq!(keyval_from_name("z"), Some('z' as u32));
        assert_eq!(keyval_from_name("F99"), None);
        assert_eq!(keyval_name(keyval::KP_PAGE_DOWN), "KP_Page_Down");
        assert_eq!(keyval_name('7' as u32), "7");
        assert_eq!(keyval_from_name("0x"), None);
        assert_eq!(keyval_from_name("0xzz"), None);
    }

    #[test]
    fn test_unnamed_keyval_round_trips() {
        assert_eq!(keyval_name(0x1008_ff13), "0x1008ff13");
        assert_eq!(keyval_from_name("0x1008ff13"), Some(0x1008_ff13));
        assert_eq!(keyval_from_name("0x00e9"), Some(0xe9));

        let key = KeySpec::new(0x1008_ff13, ModifierType::CONTROL | ModifierType::SHIFT);
        let name = key.accelerator_name();
        assert_eq!(KeySpec::parse_accelerator(&name), Some(key), "{name}");
    }
}
