//! Data-driven game balance
//!
//! Level progression and number combinations are loaded once at startup
//! (normally from `levels/levels.json`) and stay read-only for the session.
//! Missing or broken data never reaches the player: the built-in tables
//! take over and a warning is logged.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use crate::consts::{DEFAULT_FALL_MS, MAX_TILE};

/// One level definition
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelDef {
    pub level: u32,
    /// Fall interval in milliseconds
    #[serde(rename = "speed", default = "default_fall_ms")]
    pub fall_ms: u32,
    /// Largest value that can spawn on this level
    #[serde(default = "default_max_number")]
    pub max_number: u8,
    /// Score needed to move on to the next level
    pub target_score: u64,
}

fn default_fall_ms() -> u32 {
    DEFAULT_FALL_MS
}

fn default_max_number() -> u8 {
    5
}

/// What two tiles turn into
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ComboRule {
    pub result: u8,
    pub points: u32,
    /// Emoji shown when the merge happens
    #[serde(default)]
    pub celebration: String,
}

impl ComboRule {
    pub fn new(result: u8, points: u32, celebration: &str) -> Self {
        Self {
            result,
            points,
            celebration: celebration.to_string(),
        }
    }
}

/// Ordered pair -> combination lookup
///
/// `(landed, neighbor)` order matters: "1+2" and "2+1" are separate entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComboTable {
    rules: BTreeMap<(u8, u8), ComboRule>,
}

impl ComboTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, first: u8, second: u8, rule: ComboRule) {
        self.rules.insert((first, second), rule);
    }

    /// Unknown pairs are simply "no combination"
    pub fn get(&self, first: u8, second: u8) -> Option<&ComboRule> {
        self.rules.get(&(first, second))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(u8, u8), &ComboRule)> {
        self.rules.iter()
    }

    /// Parse a `"a+b"` key
    pub fn parse_key(key: &str) -> Option<(u8, u8)> {
        let (a, b) = key.split_once('+')?;
        Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
    }
}

/// Problems found in level data
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("level data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("level table is empty")]
    NoLevels,

    #[error("level {level} has a zero fall speed")]
    ZeroSpeed { level: u32 },

    #[error("level {level} has maxNumber {max_number}, expected 1..=10")]
    MaxNumberOutOfRange { level: u32, max_number: u8 },

    #[error("combination key {0:?} is not of the form \"a+b\"")]
    BadComboKey(String),
}

/// On-disk layout of `levels.json`
#[derive(Debug, Deserialize)]
struct RawTuning {
    levels: Vec<LevelDef>,
    #[serde(default)]
    combos: BTreeMap<String, ComboRule>,
}

/// Level and combination tables for a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuning {
    /// Never empty
    levels: Vec<LevelDef>,
    combos: ComboTable,
}

impl Default for Tuning {
    /// One gentle level and a handful of small sums
    fn default() -> Self {
        let mut combos = ComboTable::new();
        combos.insert(1, 1, ComboRule::new(2, 10, "🎉"));
        combos.insert(1, 2, ComboRule::new(3, 15, "⭐"));
        combos.insert(2, 1, ComboRule::new(3, 15, "⭐"));
        combos.insert(2, 2, ComboRule::new(4, 20, "🌟"));
        combos.insert(2, 3, ComboRule::new(5, 25, "✨"));
        combos.insert(3, 2, ComboRule::new(5, 25, "✨"));

        Self {
            levels: vec![LevelDef {
                level: 1,
                fall_ms: DEFAULT_FALL_MS,
                max_number: 5,
                target_score: 100,
            }],
            combos,
        }
    }
}

impl Tuning {
    /// Build validated tables
    pub fn new(levels: Vec<LevelDef>, combos: ComboTable) -> Result<Self, TuningError> {
        if levels.is_empty() {
            return Err(TuningError::NoLevels);
        }
        for def in &levels {
            if def.fall_ms == 0 {
                return Err(TuningError::ZeroSpeed { level: def.level });
            }
            if def.max_number == 0 || def.max_number > MAX_TILE {
                return Err(TuningError::MaxNumberOutOfRange {
                    level: def.level,
                    max_number: def.max_number,
                });
            }
        }
        Ok(Self { levels, combos })
    }

    /// Parse `levels.json` contents
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let raw: RawTuning = serde_json::from_str(json)?;

        let mut combos = ComboTable::new();
        for (key, rule) in raw.combos {
            let (a, b) = ComboTable::parse_key(&key).ok_or(TuningError::BadComboKey(key))?;
            combos.insert(a, b, rule);
        }

        Self::new(raw.levels, combos)
    }

    /// Parse level data, falling back to the built-in tables on any problem
    pub fn load_or_default(json: Option<&str>) -> Self {
        let Some(json) = json else {
            log::warn!("Could not load level data, using defaults");
            return Self::default();
        };

        match Self::from_json(json) {
            Ok(tuning) => {
                log::info!(
                    "Loaded {} levels and {} combinations",
                    tuning.levels.len(),
                    tuning.combos.len()
                );
                tuning
            }
            Err(e) => {
                log::warn!("Invalid level data ({}), using defaults", e);
                Self::default()
            }
        }
    }

    pub fn levels(&self) -> &[LevelDef] {
        &self.levels
    }

    pub fn combos(&self) -> &ComboTable {
        &self.combos
    }

    /// Exact lookup by level number
    pub fn level(&self, level: u32) -> Option<&LevelDef> {
        self.levels.iter().find(|def| def.level == level)
    }

    /// Lookup by level number, falling back to the first definition
    pub fn level_or_first(&self, level: u32) -> &LevelDef {
        self.level(level).unwrap_or(&self.levels[0])
    }

    /// Highest defined level number
    pub fn max_level(&self) -> u32 {
        self.levels.iter().map(|def| def.level).max().unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLED: &str = include_str!("../levels/levels.json");

    #[test]
    fn test_default_tables() {
        let tuning = Tuning::default();
        assert_eq!(tuning.levels().len(), 1);
        assert_eq!(tuning.level_or_first(1).fall_ms, 1500);
        assert_eq!(tuning.level_or_first(1).max_number, 5);
        assert_eq!(tuning.combos().len(), 6);
        assert_eq!(tuning.combos().get(2, 2), Some(&ComboRule::new(4, 20, "🌟")));
        assert_eq!(tuning.combos().get(3, 3), None);
    }

    #[test]
    fn test_bundled_levels_parse() {
        let tuning = Tuning::from_json(BUNDLED).unwrap();
        assert!(tuning.levels().len() > 1);
        assert_eq!(tuning.level(1).map(|l| l.level), Some(1));
        // Every bundled result must be a real tile
        for (_, rule) in tuning.combos().iter() {
            assert!(rule.result >= 1 && rule.result <= MAX_TILE);
        }
    }

    #[test]
    fn test_parse_key() {
        assert_eq!(ComboTable::parse_key("1+2"), Some((1, 2)));
        assert_eq!(ComboTable::parse_key(" 4 + 6 "), Some((4, 6)));
        assert_eq!(ComboTable::parse_key("1-2"), None);
        assert_eq!(ComboTable::parse_key("a+2"), None);
    }

    #[test]
    fn test_field_defaults() {
        let json = r#"{"levels": [{"level": 1, "targetScore": 50}]}"#;
        let tuning = Tuning::from_json(json).unwrap();
        let def = tuning.level_or_first(1);
        assert_eq!(def.fall_ms, DEFAULT_FALL_MS);
        assert_eq!(def.max_number, 5);
        assert!(tuning.combos().is_empty());
    }

    #[test]
    fn test_invalid_data_errors() {
        assert!(matches!(
            Tuning::from_json("not json"),
            Err(TuningError::Json(_))
        ));
        assert!(matches!(
            Tuning::from_json(r#"{"levels": []}"#),
            Err(TuningError::NoLevels)
        ));
        assert!(matches!(
            Tuning::from_json(r#"{"levels": [{"level": 2, "speed": 0, "targetScore": 1}]}"#),
            Err(TuningError::ZeroSpeed { level: 2 })
        ));
        assert!(matches!(
            Tuning::from_json(r#"{"levels": [{"level": 1, "maxNumber": 11, "targetScore": 1}]}"#),
            Err(TuningError::MaxNumberOutOfRange { level: 1, max_number: 11 })
        ));
        let bad_key = r#"{"levels": [{"level": 1, "targetScore": 1}],
            "combos": {"one+two": {"result": 3, "points": 15}}}"#;
        assert!(matches!(
            Tuning::from_json(bad_key),
            Err(TuningError::BadComboKey(_))
        ));
    }

    #[test]
    fn test_load_or_default_falls_back() {
        assert_eq!(Tuning::load_or_default(None), Tuning::default());
        assert_eq!(Tuning::load_or_default(Some("{")), Tuning::default());
        let loaded = Tuning::load_or_default(Some(BUNDLED));
        assert_ne!(loaded, Tuning::default());
    }

    #[test]
    fn test_level_lookup() {
        let tuning = Tuning::from_json(BUNDLED).unwrap();
        let max = tuning.max_level();
        assert!(tuning.level(max).is_some());
        assert!(tuning.level(max + 1).is_none());
        assert_eq!(tuning.level_or_first(max + 1).level, 1);
    }
}
