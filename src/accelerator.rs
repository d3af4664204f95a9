//! Accelerator grammar shared by the global hotkey and the menu.
//!
//! An accelerator is `Modifier+...+Key`, e.g. `Alt+G` or `CmdOrCtrl+Shift+N`.
//! Parsing is case-insensitive and accepts the common aliases; `normalize`
//! returns the canonical spelling that both the global-shortcut plugin and
//! the native menu understand.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Modifier {
    CmdOrCtrl,
    Ctrl,
    Alt,
    Shift,
    Super,
}

impl Modifier {
    fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "cmdorctrl" | "commandorcontrol" | "cmdorcontrol" | "commandorctrl" => {
                Some(Self::CmdOrCtrl)
            }
            "ctrl" | "control" => Some(Self::Ctrl),
            "alt" | "option" => Some(Self::Alt),
            "shift" => Some(Self::Shift),
            "super" | "meta" | "cmd" | "command" => Some(Self::Super),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::CmdOrCtrl => "CmdOrCtrl",
            Self::Ctrl => "Ctrl",
            Self::Alt => "Alt",
            Self::Shift => "Shift",
            Self::Super => "Super",
        }
    }
}

const NAMED_KEYS: &[&str] = &[
    "Space", "Tab", "Enter", "Escape", "Backspace", "Delete", "Insert", "Home", "End", "PageUp",
    "PageDown", "Up", "Down", "Left", "Right",
];

const PUNCTUATION: &[char] = &['-', '=', ',', '.', '/', ';', '\'', '[', ']', '\\', '`'];

/// Parsed modifier+key combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accelerator {
    modifiers: Vec<Modifier>,
    key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AcceleratorError {
    #[error("accelerator is empty")]
    Empty,
    #[error("unknown key `{0}`")]
    UnknownKey(String),
    #[error("modifier `{0}` appears more than once")]
    DuplicateModifier(String),
    #[error("`{0}` needs a key after the modifiers")]
    MissingKey(String),
    #[error("`{0}` needs at least one modifier")]
    MissingModifier(String),
}

impl Accelerator {
    pub fn parse(input: &str) -> Result<Self, AcceleratorError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AcceleratorError::Empty);
        }

        let tokens: Vec<&str> = trimmed.split('+').map(str::trim).collect();
        let (key_token, modifier_tokens) = tokens
            .split_last()
            .ok_or(AcceleratorError::Empty)?;

        let mut modifiers = Vec::with_capacity(modifier_tokens.len());
        for token in modifier_tokens {
            let modifier = Modifier::parse(token).ok_or_else(|| {
                if token.is_empty() {
                    AcceleratorError::UnknownKey("+".to_string())
                } else {
                    AcceleratorError::UnknownKey((*token).to_string())
                }
            })?;
            if modifiers.contains(&modifier) {
                return Err(AcceleratorError::DuplicateModifier(modifier.as_str().to_string()));
            }
            modifiers.push(modifier);
        }

        if Modifier::parse(key_token).is_some() {
            return Err(AcceleratorError::MissingKey(trimmed.to_string()));
        }
        let key = normalize_key(key_token)
            .ok_or_else(|| AcceleratorError::UnknownKey((*key_token).to_string()))?;

        if modifiers.is_empty() && !is_function_key(&key) {
            return Err(AcceleratorError::MissingModifier(trimmed.to_string()));
        }

        modifiers.sort();
        Ok(Self { modifiers, key })
    }

    #[cfg(test)]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[cfg(test)]
    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }
}

impl fmt::Display for Accelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{}+", modifier.as_str())?;
        }
        f.write_str(&self.key)
    }
}

/// Canonical spelling of `input`, or the reason it is not an accelerator.
pub fn normalize(input: &str) -> Result<String, AcceleratorError> {
    Accelerator::parse(input).map(|accelerator| accelerator.to_string())
}

fn normalize_key(token: &str) -> Option<String> {
    let mut chars = token.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphanumeric() {
            return Some(c.to_ascii_uppercase().to_string());
        }
        if PUNCTUATION.contains(&c) {
            return Some(c.to_string());
        }
        return None;
    }

    let lower = token.to_ascii_lowercase();
    let alias = match lower.as_str() {
        "return" => Some("Enter"),
        "esc" => Some("Escape"),
        "del" => Some("Delete"),
        "arrowup" => Some("Up"),
        "arrowdown" => Some("Down"),
        "arrowleft" => Some("Left"),
        "arrowright" => Some("Right"),
        _ => None,
    };
    if let Some(alias) = alias {
        return Some(alias.to_string());
    }

    if let Some(named) = NAMED_KEYS
        .iter()
        .find(|named| named.eq_ignore_ascii_case(token))
    {
        return Some((*named).to_string());
    }

    let number = lower.strip_prefix('f')?.parse::<u8>().ok()?;
    (1..=24).contains(&number).then(|| format!("F{number}"))
}

fn is_function_key(key: &str) -> bool {
    key.len() > 1 && key.starts_with('F') && key[1..].chars().all(|c| c.is_ascii_digit())
}
