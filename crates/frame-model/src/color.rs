//! Color classes and their reference fingerprints.
//!
//! The table is fixed for the life of the process. Enumeration order is
//! significant: fingerprint tests run in [`ColorClass::ALL`] order and the
//! first match wins.

use serde::{Deserialize, Serialize};
use tracelock_common::error::TracelockError;

/// An 8-bit RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Summed absolute channel difference (Manhattan distance in RGB).
    pub fn manhattan(&self, other: &Rgb) -> u32 {
        self.r.abs_diff(other.r) as u32
            + self.g.abs_diff(other.g) as u32
            + self.b.abs_diff(other.b) as u32
    }

    /// Largest pairwise difference between this color's own channels.
    pub fn chroma_spread(&self) -> u8 {
        self.r
            .abs_diff(self.g)
            .max(self.g.abs_diff(self.b))
            .max(self.r.abs_diff(self.b))
    }

    /// Integer luma (BT.601 weights).
    pub fn luma(&self) -> u8 {
        ((self.r as u32 * 299 + self.g as u32 * 587 + self.b as u32 * 114) / 1000) as u8
    }

    /// `#RRGGBB` string.
    pub fn hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// One of the four tracked object colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorClass {
    Red,
    Blue,
    Purple,
    Green,
}

impl ColorClass {
    /// All classes in fingerprint-test order.
    pub const ALL: [ColorClass; 4] = [
        ColorClass::Red,
        ColorClass::Blue,
        ColorClass::Purple,
        ColorClass::Green,
    ];

    /// Reference color sampled from the frame.
    pub const fn fingerprint(self) -> Rgb {
        match self {
            ColorClass::Red => Rgb::new(241, 78, 84),
            ColorClass::Blue => Rgb::new(0, 176, 225),
            ColorClass::Purple => Rgb::new(191, 127, 245),
            ColorClass::Green => Rgb::new(0, 225, 110),
        }
    }

    /// Color used when drawing overlay primitives for this class.
    pub const fn display(self) -> Rgb {
        match self {
            ColorClass::Red => Rgb::new(0xFF, 0x33, 0x33),
            ColorClass::Blue => Rgb::new(0x33, 0xBB, 0xFF),
            ColorClass::Purple => Rgb::new(0xCC, 0x66, 0xFF),
            ColorClass::Green => Rgb::new(0x00, 0xFF, 0x66),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ColorClass::Red => "red",
            ColorClass::Blue => "blue",
            ColorClass::Purple => "purple",
            ColorClass::Green => "green",
        }
    }

    /// Position in [`ColorClass::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether `pixel` is within `tolerance` (exclusive) of this fingerprint.
    pub fn matches(self, pixel: &Rgb, tolerance: u32) -> bool {
        pixel.manhattan(&self.fingerprint()) < tolerance
    }
}

impl std::fmt::Display for ColorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ColorClass {
    type Err = TracelockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColorClass::ALL
            .into_iter()
            .find(|class| class.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TracelockError::config(format!("unknown color class '{s}'")))
    }
}
