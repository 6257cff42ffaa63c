//! RGB colors in `#RRGGBB` notation.

use std::fmt;
use std::str::FromStr;

use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::errors::Error;

/// An RGB color with red, green, and blue components (0-255 each).
///
/// Colors travel through commands, snapshots and profiles as a `#` prefixed
/// six digit hex string, which is also their serialized form.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use lumen_bridge::Color;
///
/// let green = Color::from_str("#00FF00").unwrap();
/// assert_eq!(green, Color::rgb(0, 255, 0));
/// assert_eq!(green.to_string(), "#00FF00");
/// ```
#[derive(
    Default, Debug, Clone, Copy, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr,
)]
pub struct Color {
    pub(crate) red: u8,
    pub(crate) green: u8,
    pub(crate) blue: u8,
}

impl Color {
    /// Create a color with the given RGB values.
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Create a default color (black: #000000).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn red(&self) -> u8 {
        self.red
    }

    pub fn green(&self) -> u8 {
        self.green
    }

    pub fn blue(&self) -> u8 {
        self.blue
    }
}

impl FromStr for Color {
    type Err = Error;

    /// Parse from a hex string (e.g., "#FF8000").
    ///
    /// The leading `#` is required and exactly six hex digits must follow.
    fn from_str(s: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidColorString(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
        };
        Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}
