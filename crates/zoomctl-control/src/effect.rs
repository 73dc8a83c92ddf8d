//! Effect type codes.
//!
//! The table below is community-sourced and covers the common effects only.
//! Codes outside it are still carried through as [`EffectType::Code`].

use std::fmt;

use serde::{Serialize, Serializer};

/// Effect family, used for grouping in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectCategory {
    Dynamics,
    Filter,
    Drive,
    Amp,
    Modulation,
    Delay,
    Reverb,
    Special,
}

impl fmt::Display for EffectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EffectCategory::Dynamics => "dynamics",
            EffectCategory::Filter => "filter",
            EffectCategory::Drive => "drive",
            EffectCategory::Amp => "amp",
            EffectCategory::Modulation => "modulation",
            EffectCategory::Delay => "delay",
            EffectCategory::Reverb => "reverb",
            EffectCategory::Special => "special",
        })
    }
}

/// One entry of the known effect table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EffectInfo {
    pub name: &'static str,
    pub code: u16,
    pub category: EffectCategory,
}

const fn info(name: &'static str, code: u16, category: EffectCategory) -> EffectInfo {
    EffectInfo {
        name,
        code,
        category,
    }
}

/// Known effect codes, ordered by code.
pub const KNOWN_EFFECTS: &[EffectInfo] = &[
    info("COMP", 0x01, EffectCategory::Dynamics),
    info("LIMITER", 0x02, EffectCategory::Dynamics),
    info("NOISE_GATE", 0x03, EffectCategory::Dynamics),
    info("WAH", 0x10, EffectCategory::Filter),
    info("AUTO_WAH", 0x11, EffectCategory::Filter),
    info("OVERDRIVE", 0x20, EffectCategory::Drive),
    info("DISTORTION", 0x21, EffectCategory::Drive),
    info("FUZZ", 0x22, EffectCategory::Drive),
    info("BOOSTER", 0x23, EffectCategory::Drive),
    info("CLEAN", 0x30, EffectCategory::Amp),
    info("CRUNCH", 0x31, EffectCategory::Amp),
    info("LEAD", 0x32, EffectCategory::Amp),
    info("CHORUS", 0x40, EffectCategory::Modulation),
    info("FLANGER", 0x41, EffectCategory::Modulation),
    info("PHASER", 0x42, EffectCategory::Modulation),
    info("TREMOLO", 0x43, EffectCategory::Modulation),
    info("VIBRATO", 0x44, EffectCategory::Modulation),
    info("DELAY", 0x50, EffectCategory::Delay),
    info("ECHO", 0x51, EffectCategory::Delay),
    info("TAPE_ECHO", 0x52, EffectCategory::Delay),
    info("HALL", 0x60, EffectCategory::Reverb),
    info("ROOM", 0x61, EffectCategory::Reverb),
    info("SPRING", 0x62, EffectCategory::Reverb),
    info("PLATE", 0x63, EffectCategory::Reverb),
    info("PITCH", 0x70, EffectCategory::Special),
    info("HARMONY", 0x71, EffectCategory::Special),
    info("OCTAVE", 0x72, EffectCategory::Special),
];

/// The effect loaded in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EffectType {
    /// The slot layout could not be decoded.
    #[default]
    Unknown,
    /// A raw effect code, known to the table or not.
    Code(u16),
}

impl EffectType {
    /// Table entry for this code, if it is a known one.
    pub fn info(&self) -> Option<&'static EffectInfo> {
        match self {
            EffectType::Unknown => None,
            EffectType::Code(code) => KNOWN_EFFECTS.iter().find(|e| e.code == *code),
        }
    }

    /// Look up a known effect by name. Case and `-`/`_` are not significant.
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = name.trim().replace('-', "_");
        KNOWN_EFFECTS
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(&wanted))
            .map(|e| EffectType::Code(e.code))
    }

    /// The raw code, if any.
    pub fn code(&self) -> Option<u16> {
        match self {
            EffectType::Unknown => None,
            EffectType::Code(code) => Some(*code),
        }
    }
}

impl fmt::Display for EffectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.info()) {
            (EffectType::Unknown, _) => f.write_str("Unknown"),
            (_, Some(info)) => f.write_str(info.name),
            (EffectType::Code(code), None) => write!(f, "{code:#06x}"),
        }
    }
}

impl Serialize for EffectType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
