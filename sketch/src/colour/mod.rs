//! Couleurs des catégories et des polygones
//!
//! Formats acceptés : `#RRGGBB` et `#AARRGGBB` (le `#` est optionnel,
//! la casse est indifférente).

mod names;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::SketchError;
use names::NAMED_COLOURS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Colour {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    const fn from_u32(rgb: u32) -> Self {
        Self::rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    /// Parse une couleur hexadécimale
    pub fn parse(text: &str) -> Result<Self, SketchError> {
        let hex = text.trim().trim_start_matches('#');
        let invalid = || SketchError::InvalidColour(text.to_string());

        if !hex.is_ascii() {
            return Err(invalid());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());

        match hex.len() {
            6 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self {
                a: byte(0)?,
                r: byte(2)?,
                g: byte(4)?,
                b: byte(6)?,
            }),
            _ => Err(invalid()),
        }
    }

    /// `#RRGGBB` en majuscules
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// `#AARRGGBB` en majuscules
    pub fn to_hex_argb(self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.a, self.r, self.g, self.b)
    }

    fn distance(self, other: Colour) -> f64 {
        let dr = self.r as f64 - other.r as f64;
        let dg = self.g as f64 - other.g as f64;
        let db = self.b as f64 - other.b as f64;
        (dr * dr + dg * dg + db * db).sqrt()
    }

    /// Nom de la couleur nommée la plus proche (distance euclidienne RGB)
    ///
    /// À distance égale, le premier nom de la table l'emporte.
    pub fn closest_name(self) -> &'static str {
        let mut best = ("black", f64::INFINITY);
        for &(name, rgb) in NAMED_COLOURS {
            let d = self.distance(Colour::from_u32(rgb));
            if d < best.1 {
                best = (name, d);
            }
        }
        best.0
    }

    /// Couleur nommée exacte
    pub fn named(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        NAMED_COLOURS
            .iter()
            .find(|(n, _)| *n == lower)
            .map(|&(_, rgb)| Colour::from_u32(rgb))
    }

    /// Éclaircit (pourcentage positif) ou assombrit (négatif) la couleur
    pub fn adjust(self, percent: i32) -> Self {
        let factor = percent as f64 / 100.0;
        let channel = |c: u8| {
            let c = c as f64;
            let v = if factor > 0.0 {
                c + (255.0 - c) * factor
            } else {
                c * (1.0 + factor)
            };
            // Troncature puis bornage
            (v as i64).clamp(0, 255) as u8
        };
        Self {
            r: channel(self.r),
            g: channel(self.g),
            b: channel(self.b),
            a: self.a,
        }
    }
}

impl Default for Colour {
    fn default() -> Self {
        Self::rgb(0xFF, 0xFF, 0xFF)
    }
}

impl FromStr for Colour {
    type Err = SketchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Colour {
    type Error = SketchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Colour> for String {
    fn from(colour: Colour) -> Self {
        if colour.a == 0xFF {
            colour.to_hex()
        } else {
            colour.to_hex_argb()
        }
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from(*self))
    }
}
