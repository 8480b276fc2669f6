//! Angle adjuster presets and the cap lift interference model.
//!
//! Each preset names a firing angle for the adjuster arm together with the
//! band of cap lift positions that would collide with the puncher at that
//! angle. Presets are looked up by key; the numeric angle is data, not an
//! enum discriminant.

use heapless::LinearMap;
use log::warn;

/// A named firing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShotPreset {
    NearHighFlag,
    NearMidFlag,
    NearLowFlag,
    FarHighFlag,
    FarLowFlag,
}

impl ShotPreset {
    pub const ALL: [ShotPreset; 5] = [
        ShotPreset::NearHighFlag,
        ShotPreset::NearMidFlag,
        ShotPreset::NearLowFlag,
        ShotPreset::FarHighFlag,
        ShotPreset::FarLowFlag,
    ];

    /// Short label for the brain screen.
    pub const fn label(self) -> &'static str {
        match self {
            ShotPreset::NearHighFlag => "near-high",
            ShotPreset::NearMidFlag => "near-mid",
            ShotPreset::NearLowFlag => "near-low",
            ShotPreset::FarHighFlag => "far-high",
            ShotPreset::FarLowFlag => "far-low",
        }
    }
}

/// Adjuster angle and the lift band it collides with, all in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleConfig {
    /// Adjuster position target.
    pub angle: f64,
    /// Lowest lift position inside the interference band.
    pub lower: f64,
    /// Highest lift position inside the interference band.
    pub upper: f64,
}

impl AngleConfig {
    /// Creates a config, ordering the bounds if they were given reversed.
    pub fn new(angle: f64, lower: f64, upper: f64) -> Self {
        AngleConfig {
            angle,
            lower: lower.min(upper),
            upper: lower.max(upper),
        }
    }

    pub fn midpoint(&self) -> f64 { (self.lower + self.upper) / 2.0 }

    /// Whether a lift at `lift_position` is inside the band, bounds included.
    pub fn interferes(&self, lift_position: f64) -> bool {
        self.lower <= lift_position && lift_position <= self.upper
    }
}

const TABLE_CAPACITY: usize = 8;

/// Lookup table from preset to configuration.
#[derive(Debug, Clone)]
pub struct AngleTable {
    presets: LinearMap<ShotPreset, AngleConfig, TABLE_CAPACITY>,
}

impl AngleTable {
    /// An empty table.
    pub fn new() -> Self {
        AngleTable {
            presets: LinearMap::new(),
        }
    }

    /// Adds or replaces a preset.
    pub fn with(mut self, preset: ShotPreset, config: AngleConfig) -> Self {
        self.insert(preset, config);
        self
    }

    pub fn insert(&mut self, preset: ShotPreset, config: AngleConfig) {
        if self.presets.insert(preset, config).is_err() {
            warn!("Angle table full, dropping {}", preset.label());
        }
    }

    pub fn get(&self, preset: ShotPreset) -> Option<AngleConfig> { self.presets.get(&preset).copied() }

    pub fn len(&self) -> usize { self.presets.len() }

    pub fn is_empty(&self) -> bool { self.presets.is_empty() }
}

impl Default for AngleTable {
    /// The competition presets. The low flag angle is shared between the
    /// near and far tiles.
    fn default() -> Self {
        AngleTable::new()
            .with(ShotPreset::NearHighFlag, AngleConfig::new(45.0, 40.0, 95.0))
            .with(ShotPreset::NearMidFlag, AngleConfig::new(60.0, 30.0, 80.0))
            .with(ShotPreset::NearLowFlag, AngleConfig::new(75.0, 20.0, 60.0))
            .with(ShotPreset::FarHighFlag, AngleConfig::new(57.0, 35.0, 85.0))
            .with(ShotPreset::FarLowFlag, AngleConfig::new(75.0, 20.0, 60.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_is_inclusive() {
        let config = AngleConfig::new(50.0, 10.0, 30.0);
        assert!(!config.interferes(9.9));
        assert!(config.interferes(10.0));
        assert!(config.interferes(20.0));
        assert!(config.interferes(30.0));
        assert!(!config.interferes(30.1));
        // Well above the band is clear, not merely "above the lower bound".
        assert!(!config.interferes(500.0));
    }

    #[test]
    fn reversed_bounds_are_ordered() {
        let config = AngleConfig::new(75.0, 40.0, 20.0);
        assert_eq!((config.lower, config.upper), (20.0, 40.0));
        assert_eq!(config.midpoint(), 30.0);
    }

    #[test]
    fn default_table_has_every_preset() {
        let table = AngleTable::default();
        assert_eq!(table.len(), ShotPreset::ALL.len());
        for preset in ShotPreset::ALL {
            assert!(table.get(preset).is_some(), "{} missing", preset.label());
        }
        assert_eq!(table.get(ShotPreset::NearHighFlag).map(|c| c.angle), Some(45.0));
        assert_eq!(table.get(ShotPreset::FarHighFlag).map(|c| c.angle), Some(57.0));
    }

    #[test]
    fn insert_replaces() {
        let mut table = AngleTable::new();
        assert!(table.is_empty());
        table.insert(ShotPreset::NearLowFlag, AngleConfig::new(70.0, 0.0, 10.0));
        table.insert(ShotPreset::NearLowFlag, AngleConfig::new(72.0, 0.0, 10.0));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(ShotPreset::NearLowFlag).map(|c| c.angle), Some(72.0));
        assert_eq!(table.get(ShotPreset::FarLowFlag), None);
    }
}
