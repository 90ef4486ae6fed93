//! Phase colors.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// An opaque sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xff, 0xff, 0xff);
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid color {0:?} (expected #rrggbb)")]
pub struct ColorParseError(pub String);

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .filter(|h| h.len() == 6 && h.is_ascii())
            .ok_or_else(|| ColorParseError(s.to_string()))?;
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ColorParseError(s.to_string()))
        };
        Ok(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Mapping from phase name to bar color, with a fallback for unmapped phases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: BTreeMap<String, Rgb>,
    fallback: Rgb,
}

impl Palette {
    pub fn new(colors: BTreeMap<String, Rgb>, fallback: Rgb) -> Self {
        Self { colors, fallback }
    }

    /// Color for `phase`, or the fallback if the phase is unmapped.
    pub fn get(&self, phase: &str) -> Rgb {
        self.lookup(phase).unwrap_or(self.fallback)
    }

    /// Color for `phase` only if the palette maps it explicitly.
    pub fn lookup(&self, phase: &str) -> Option<Rgb> {
        self.colors.get(phase).copied()
    }

    pub fn fallback(&self) -> Rgb {
        self.fallback
    }

    /// Add or replace the color of a phase.
    pub fn insert(&mut self, phase: impl Into<String>, color: Rgb) {
        self.colors.insert(phase.into(), color);
    }

    pub fn set_fallback(&mut self, color: Rgb) {
        self.fallback = color;
    }

    /// Explicitly mapped phases in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Rgb)> {
        self.colors.iter().map(|(phase, color)| (phase.as_str(), *color))
    }
}

impl Default for Palette {
    /// The stock project-phase palette with a white fallback.
    fn default() -> Self {
        let colors = [
            ("Preparation", Rgb(0x00, 0x3f, 0x5c)),
            ("Pre-study", Rgb(0x44, 0x4e, 0x86)),
            ("Establishment", Rgb(0x95, 0x51, 0x96)),
            ("Implementation", Rgb(0xdd, 0x51, 0x82)),
            ("Stock build-up", Rgb(0xff, 0x6e, 0x54)),
            ("Closure", Rgb(0xff, 0xa6, 0x00)),
        ]
        .into_iter()
        .map(|(phase, color)| (phase.to_string(), color))
        .collect();
        Self::new(colors, Rgb::WHITE)
    }
}
