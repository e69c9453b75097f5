//! Accelerator strings to compositor trigger arguments.
//!
//! This module provides:
//! - `Accelerator` - a parsed accelerator (modifiers + XKB keysym)
//! - `Modifiers` - modifier flags and their compositor mask bits
//! - `AcceleratorParseError` - detailed parse errors for logs and the console
//!
//! Both GTK syntax (`<Control><Shift>q`) and plus-joined syntax (`Ctrl+Shift+Q`)
//! are accepted. Letters are lowercased the way GTK does, so `<Control>Q` and
//! `<Control>q` register the same keysym.

use std::fmt;
use thiserror::Error;

/// Modifier bits understood by the trigger registration manager.
pub const MOD_ALT: u32 = 0x01;
pub const MOD_SHIFT: u32 = 0x08;
pub const MOD_CTRL: u32 = 0x100;
pub const MOD_META: u32 = 0x800;

/// Errors that can occur when parsing an accelerator string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcceleratorParseError {
    #[error("accelerator string is empty")]
    Empty,
    #[error("accelerator has no key, only modifiers")]
    MissingKey,
    #[error("unknown modifier '{0}'")]
    UnknownModifier(String),
    #[error("unknown key '{0}'")]
    UnknownKey(String),
}

/// Modifier keys for an accelerator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Bit mask sent with `register_keyboard_sym_trigger`.
    pub fn mask(&self) -> u32 {
        let mut mask = 0;
        if self.alt {
            mask |= MOD_ALT;
        }
        if self.shift {
            mask |= MOD_SHIFT;
        }
        if self.ctrl {
            mask |= MOD_CTRL;
        }
        if self.meta {
            mask |= MOD_META;
        }
        mask
    }

    fn set(&mut self, token: &str) -> Result<(), AcceleratorParseError> {
        match token.to_lowercase().as_str() {
            "control" | "ctrl" | "ctl" | "primary" => self.ctrl = true,
            "shift" | "shft" => self.shift = true,
            "alt" | "mod1" | "option" | "opt" => self.alt = true,
            "super" | "meta" | "mod4" | "logo" | "cmd" | "win" => self.meta = true,
            _ => return Err(AcceleratorParseError::UnknownModifier(token.to_string())),
        }
        Ok(())
    }
}

/// A parsed accelerator: modifiers plus the XKB keysym of the main key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Accelerator {
    pub modifiers: Modifiers,
    /// Display name of the key (`Q`, `Return`, `F5`)
    pub key: String,
    pub keysym: u32,
}

impl Accelerator {
    pub fn parse(s: &str) -> Result<Self, AcceleratorParseError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AcceleratorParseError::Empty);
        }

        let mut modifiers = Modifiers::default();
        let mut rest = s;

        // GTK form: leading <Modifier> groups
        while let Some(after) = rest.strip_prefix('<') {
            let end = after
                .find('>')
                .ok_or_else(|| AcceleratorParseError::UnknownModifier(rest.to_string()))?;
            modifiers.set(&after[..end])?;
            rest = after[end + 1..].trim_start();
        }

        // Plus-joined form: every token but the last is a modifier
        let key_token = if rest.len() > 1 && rest.contains('+') {
            let mut parts: Vec<&str> = rest.split('+').map(str::trim).collect();
            let key = parts.pop().unwrap_or_default();
            for part in parts {
                if part.is_empty() {
                    return Err(AcceleratorParseError::UnknownModifier(rest.to_string()));
                }
                modifiers.set(part)?;
            }
            key
        } else {
            rest
        };

        if key_token.is_empty() {
            return Err(AcceleratorParseError::MissingKey);
        }
        if modifiers.set(key_token).is_ok() {
            // "Ctrl+Shift" or "<Control>Alt": a modifier where the key should be
            return Err(AcceleratorParseError::MissingKey);
        }

        let (key, keysym) = resolve_key(key_token)
            .ok_or_else(|| AcceleratorParseError::UnknownKey(key_token.to_string()))?;

        Ok(Self {
            modifiers,
            key,
            keysym,
        })
    }

    pub fn modifier_mask(&self) -> u32 {
        self.modifiers.mask()
    }

    /// Canonical display form, e.g. `Ctrl+Shift+Q`.
    pub fn display(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if self.modifiers.ctrl {
            parts.push("Ctrl");
        }
        if self.modifiers.alt {
            parts.push("Alt");
        }
        if self.modifiers.shift {
            parts.push("Shift");
        }
        if self.modifiers.meta {
            parts.push("Super");
        }
        parts.push(&self.key);
        parts.join("+")
    }
}

impl fmt::Display for Accelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Resolve a key token to its display name and XKB keysym.
fn resolve_key(token: &str) -> Option<(String, u32)> {
    let mut chars = token.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        // Latin-1 keysyms are the code point itself
        if c.is_ascii_graphic() {
            let lower = c.to_ascii_lowercase();
            return Some((lower.to_ascii_uppercase().to_string(), lower as u32));
        }
        return None;
    }

    let lower = token.to_lowercase();
    if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u32>().ok()) {
        if (1..=24).contains(&n) {
            return Some((format!("F{}", n), 0xffbe + n - 1));
        }
        return None;
    }

    let (name, keysym) = match lower.as_str() {
        "return" | "enter" => ("Return", 0xff0d),
        "escape" | "esc" => ("Escape", 0xff1b),
        "tab" => ("Tab", 0xff09),
        "backspace" | "back" => ("BackSpace", 0xff08),
        "delete" | "del" => ("Delete", 0xffff),
        "insert" | "ins" => ("Insert", 0xff63),
        "home" => ("Home", 0xff50),
        "end" => ("End", 0xff57),
        "left" => ("Left", 0xff51),
        "up" => ("Up", 0xff52),
        "right" => ("Right", 0xff53),
        "down" => ("Down", 0xff54),
        "page_up" | "pageup" | "pgup" | "prior" => ("Page_Up", 0xff55),
        "page_down" | "pagedown" | "pgdn" | "next" => ("Page_Down", 0xff56),
        "print" => ("Print", 0xff61),
        "pause" => ("Pause", 0xff13),
        "menu" => ("Menu", 0xff67),
        "space" => ("Space", 0x20),
        "plus" => ("plus", 0x2b),
        "minus" => ("minus", 0x2d),
        "equal" => ("equal", 0x3d),
        "comma" => ("comma", 0x2c),
        "period" => ("period", 0x2e),
        "slash" => ("slash", 0x2f),
        "backslash" => ("backslash", 0x5c),
        "semicolon" => ("semicolon", 0x3b),
        "apostrophe" | "quote" => ("apostrophe", 0x27),
        "grave" | "backquote" => ("grave", 0x60),
        "bracketleft" => ("bracketleft", 0x5b),
        "bracketright" => ("bracketright", 0x5d),
        _ => return None,
    };
    Some((name.to_string(), keysym))
}

#[cfg(test)]
#[path = "accelerator_tests.rs"]
mod tests;
