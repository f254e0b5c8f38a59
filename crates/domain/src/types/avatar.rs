//! Avatar configuration: the enumerated cosmetic attributes of the block
//! character and its environment.
//!
//! Each attribute is an independent enumerated domain; the configuration as
//! a whole carries no cross-attribute invariants. A configuration lives for
//! a single customization session and is turned into token metadata trait
//! entries at mint time via [`AvatarConfig::trait_entries`].

use crate::error::DomainError;
use crate::types::metadata::TraitEntry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Palette shared by the character body and its accessories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterColor {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
    White,
    Black,
}

impl CharacterColor {
    /// All colors, for UI pickers.
    pub fn all() -> &'static [CharacterColor] {
        &[
            CharacterColor::Red,
            CharacterColor::Blue,
            CharacterColor::Green,
            CharacterColor::Yellow,
            CharacterColor::Purple,
            CharacterColor::Orange,
            CharacterColor::White,
            CharacterColor::Black,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CharacterColor::Red => "red",
            CharacterColor::Blue => "blue",
            CharacterColor::Green => "green",
            CharacterColor::Yellow => "yellow",
            CharacterColor::Purple => "purple",
            CharacterColor::Orange => "orange",
            CharacterColor::White => "white",
            CharacterColor::Black => "black",
        }
    }

    /// RGB used when the capture pipeline has to synthesize a placeholder
    /// bitmap instead of reading back a rendered frame.
    pub fn rgb(&self) -> [u8; 3] {
        match self {
            CharacterColor::Red => [214, 48, 49],
            CharacterColor::Blue => [9, 132, 227],
            CharacterColor::Green => [0, 184, 148],
            CharacterColor::Yellow => [253, 203, 110],
            CharacterColor::Purple => [108, 92, 231],
            CharacterColor::Orange => [225, 112, 85],
            CharacterColor::White => [245, 246, 250],
            CharacterColor::Black => [45, 52, 54],
        }
    }
}

impl fmt::Display for CharacterColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for CharacterColor {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "red" => Ok(CharacterColor::Red),
            "blue" => Ok(CharacterColor::Blue),
            "green" => Ok(CharacterColor::Green),
            "yellow" => Ok(CharacterColor::Yellow),
            "purple" => Ok(CharacterColor::Purple),
            "orange" => Ok(CharacterColor::Orange),
            "white" => Ok(CharacterColor::White),
            "black" => Ok(CharacterColor::Black),
            _ => Err(DomainError::parse(format!("Unknown color: '{s}'"))),
        }
    }
}

/// Accessory worn by the character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accessory {
    #[default]
    None,
    Hat,
    Glasses,
    Necklace,
}

impl Accessory {
    pub fn all() -> &'static [Accessory] {
        &[
            Accessory::None,
            Accessory::Hat,
            Accessory::Glasses,
            Accessory::Necklace,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Accessory::None => "none",
            Accessory::Hat => "hat",
            Accessory::Glasses => "glasses",
            Accessory::Necklace => "necklace",
        }
    }
}

impl fmt::Display for Accessory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Accessory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Accessory::None),
            "hat" => Ok(Accessory::Hat),
            "glasses" => Ok(Accessory::Glasses),
            "necklace" => Ok(Accessory::Necklace),
            _ => Err(DomainError::parse(format!("Unknown accessory: '{s}'"))),
        }
    }
}

/// Body proportions of the character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyStyle {
    #[default]
    Normal,
    Slim,
    Chubby,
    Tall,
}

impl fmt::Display for BodyStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BodyStyle::Normal => "normal",
            BodyStyle::Slim => "slim",
            BodyStyle::Chubby => "chubby",
            BodyStyle::Tall => "tall",
        };
        write!(f, "{s}")
    }
}

/// Facial expression of the character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expression {
    #[default]
    Happy,
    Sad,
    Angry,
    Surprised,
    Neutral,
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Expression::Happy => "happy",
            Expression::Sad => "sad",
            Expression::Angry => "angry",
            Expression::Surprised => "surprised",
            Expression::Neutral => "neutral",
        };
        write!(f, "{s}")
    }
}

/// Scene lighting preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    #[default]
    Day,
    Sunset,
    Night,
}

impl TimeOfDay {
    /// Background sky color for synthesized placeholder frames.
    pub fn sky_rgb(&self) -> [u8; 3] {
        match self {
            TimeOfDay::Day => [0x87, 0xce, 0xeb],
            TimeOfDay::Sunset => [0xff, 0xa0, 0x7a],
            TimeOfDay::Night => [0x19, 0x19, 0x70],
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimeOfDay::Day => "day",
            TimeOfDay::Sunset => "sunset",
            TimeOfDay::Night => "night",
        };
        write!(f, "{s}")
    }
}

/// Scene weather preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    #[default]
    Clear,
    Rainy,
    Snowy,
    Foggy,
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Weather::Clear => "clear",
            Weather::Rainy => "rainy",
            Weather::Snowy => "snowy",
            Weather::Foggy => "foggy",
        };
        write!(f, "{s}")
    }
}

/// Ground material under the character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroundStyle {
    #[default]
    Grass,
    Dirt,
    Sand,
    Snow,
    Stone,
}

impl GroundStyle {
    /// Surface color for synthesized placeholder frames.
    pub fn surface_rgb(&self) -> [u8; 3] {
        match self {
            GroundStyle::Grass => [0x56, 0x7d, 0x46],
            GroundStyle::Dirt => [0x8b, 0x73, 0x55],
            GroundStyle::Sand => [0xc2, 0xb2, 0x80],
            GroundStyle::Snow => [0xf8, 0xf8, 0xff],
            GroundStyle::Stone => [0xa9, 0xa9, 0xa9],
        }
    }
}

impl fmt::Display for GroundStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GroundStyle::Grass => "grass",
            GroundStyle::Dirt => "dirt",
            GroundStyle::Sand => "sand",
            GroundStyle::Snow => "snow",
            GroundStyle::Stone => "stone",
        };
        write!(f, "{s}")
    }
}

/// The full cosmetic state of a character and its scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarConfig {
    pub color: CharacterColor,
    pub accessory: Accessory,
    pub accessory_color: CharacterColor,
    pub body_style: BodyStyle,
    pub expression: Expression,
    pub time_of_day: TimeOfDay,
    pub weather: Weather,
    pub ground: GroundStyle,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            color: CharacterColor::Blue,
            accessory: Accessory::None,
            accessory_color: CharacterColor::Red,
            body_style: BodyStyle::Normal,
            expression: Expression::Happy,
            time_of_day: TimeOfDay::Day,
            weather: Weather::Clear,
            ground: GroundStyle::Grass,
        }
    }
}

impl AvatarConfig {
    /// One metadata trait entry per configured attribute.
    pub fn trait_entries(&self) -> Vec<TraitEntry> {
        vec![
            TraitEntry::text("Character Color", self.color.to_string()),
            TraitEntry::text("Accessory", self.accessory.to_string()),
            TraitEntry::text("Accessory Color", self.accessory_color.to_string()),
            TraitEntry::text("Body Style", self.body_style.to_string()),
            TraitEntry::text("Expression", self.expression.to_string()),
            TraitEntry::text("Time of Day", self.time_of_day.to_string()),
            TraitEntry::text("Weather", self.weather.to_string()),
            TraitEntry::text("Ground", self.ground.to_string()),
        ]
    }

    /// Short scene description used for token metadata.
    pub fn describe(&self, name: &str) -> String {
        format!(
            "{name} is a {} block character enjoying a {} {} on {}.",
            self.color, self.weather, self.time_of_day, self.ground
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parse_roundtrip() {
        for color in CharacterColor::all() {
            let parsed: CharacterColor = color.to_string().parse().expect("parse back");
            assert_eq!(parsed, *color);
        }
        assert!("magenta".parse::<CharacterColor>().is_err());
    }

    #[test]
    fn test_accessory_parse() {
        assert_eq!("HAT".parse::<Accessory>().ok(), Some(Accessory::Hat));
        assert!("crown".parse::<Accessory>().is_err());
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&CharacterColor::Blue).expect("serialize");
        assert_eq!(json, "\"blue\"");
        let back: Accessory = serde_json::from_str("\"necklace\"").expect("deserialize");
        assert_eq!(back, Accessory::Necklace);
    }

    #[test]
    fn test_default_matches_initial_session() {
        let config = AvatarConfig::default();
        assert_eq!(config.color, CharacterColor::Blue);
        assert_eq!(config.accessory, Accessory::None);
        assert_eq!(config.accessory_color, CharacterColor::Red);
        assert_eq!(config.time_of_day, TimeOfDay::Day);
    }

    #[test]
    fn test_trait_entries_cover_every_attribute() {
        let entries = AvatarConfig::default().trait_entries();
        assert_eq!(entries.len(), 8);
        for entry in &entries {
            assert!(!entry.trait_type.is_empty());
        }
        // No duplicate trait types
        let mut types: Vec<_> = entries.iter().map(|e| e.trait_type.as_str()).collect();
        types.sort_unstable();
        types.dedup();
        assert_eq!(types.len(), 8);
    }
}
