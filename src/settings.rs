//! Game settings and feature flags
//!
//! Passed to the game manager at construction. Mutation goes through the
//! setters below, which clamp every numeric field into its documented range.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::modifiers::mutation::DEFAULT_MUTATION_CHANCE;

pub const MIN_MANUAL_SPEED: f32 = 0.25;
pub const MAX_MANUAL_SPEED: f32 = 3.0;
pub const MAX_LUCK: f32 = 10.0;

/// Difficulty preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Preset {
    Casual,
    #[default]
    Normal,
    Hardcore,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Casual => "Casual",
            Preset::Normal => "Normal",
            Preset::Hardcore => "Hardcore",
        }
    }

    pub fn parse(s: &str) -> Result<Self, SettingsError> {
        match s.to_lowercase().as_str() {
            "casual" | "easy" => Ok(Preset::Casual),
            "normal" => Ok(Preset::Normal),
            "hardcore" | "hard" => Ok(Preset::Hardcore),
            _ => Err(SettingsError::UnknownPreset(s.to_string())),
        }
    }

    /// Manual speed multiplier for this preset
    pub fn manual_speed(&self) -> f32 {
        match self {
            Preset::Casual => 0.8,
            Preset::Normal => 1.0,
            Preset::Hardcore => 1.3,
        }
    }

    /// Critical-hit luck for this preset
    pub fn luck(&self) -> f32 {
        match self {
            Preset::Casual => 1.5,
            Preset::Normal => 1.0,
            Preset::Hardcore => 0.75,
        }
    }

    /// Whether the comeback assistant helps out
    pub fn comeback_enabled(&self) -> bool {
        match self {
            Preset::Casual => true,
            Preset::Normal => true,
            Preset::Hardcore => false,
        }
    }
}

/// Runtime-toggleable subsystems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    AdaptiveDifficulty,
    Momentum,
    Combos,
    PowerUps,
    WorldEvents,
    Patterns,
    LaneTraits,
    Comeback,
    CriticalHits,
    Mutations,
    NearMisses,
    RandomSpawns,
    MultiplyGates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    pub adaptive_difficulty: bool,
    pub momentum: bool,
    pub combos: bool,
    pub power_ups: bool,
    pub world_events: bool,
    pub patterns: bool,
    pub lane_traits: bool,
    pub comeback: bool,
    pub critical_hits: bool,
    pub mutations: bool,
    pub near_misses: bool,
    pub random_spawns: bool,
    /// Legacy multiply gates (weighted zero unless enabled)
    pub multiply_gates: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            adaptive_difficulty: true,
            momentum: true,
            combos: true,
            power_ups: true,
            world_events: true,
            patterns: true,
            lane_traits: true,
            comeback: true,
            critical_hits: true,
            mutations: true,
            near_misses: true,
            random_spawns: true,
            multiply_gates: false,
        }
    }
}

impl FeatureFlags {
    /// Everything off (useful for isolating one subsystem)
    pub fn none() -> Self {
        Self {
            adaptive_difficulty: false,
            momentum: false,
            combos: false,
            power_ups: false,
            world_events: false,
            patterns: false,
            lane_traits: false,
            comeback: false,
            critical_hits: false,
            mutations: false,
            near_misses: false,
            random_spawns: false,
            multiply_gates: false,
        }
    }

    pub fn get(&self, feature: Feature) -> bool {
        *self.slot(feature)
    }

    fn slot(&self, feature: Feature) -> &bool {
        match feature {
            Feature::AdaptiveDifficulty => &self.adaptive_difficulty,
            Feature::Momentum => &self.momentum,
            Feature::Combos => &self.combos,
            Feature::PowerUps => &self.power_ups,
            Feature::WorldEvents => &self.world_events,
            Feature::Patterns => &self.patterns,
            Feature::LaneTraits => &self.lane_traits,
            Feature::Comeback => &self.comeback,
            Feature::CriticalHits => &self.critical_hits,
            Feature::Mutations => &self.mutations,
            Feature::NearMisses => &self.near_misses,
            Feature::RandomSpawns => &self.random_spawns,
            Feature::MultiplyGates => &self.multiply_gates,
        }
    }

    fn slot_mut(&mut self, feature: Feature) -> &mut bool {
        match feature {
            Feature::AdaptiveDifficulty => &mut self.adaptive_difficulty,
            Feature::Momentum => &mut self.momentum,
            Feature::Combos => &mut self.combos,
            Feature::PowerUps => &mut self.power_ups,
            Feature::WorldEvents => &mut self.world_events,
            Feature::Patterns => &mut self.patterns,
            Feature::LaneTraits => &mut self.lane_traits,
            Feature::Comeback => &mut self.comeback,
            Feature::CriticalHits => &mut self.critical_hits,
            Feature::Mutations => &mut self.mutations,
            Feature::NearMisses => &mut self.near_misses,
            Feature::RandomSpawns => &mut self.random_spawns,
            Feature::MultiplyGates => &mut self.multiply_gates,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub preset: Preset,
    /// Player/UI speed multiplier applied on top of difficulty and buffs
    manual_speed: f32,
    /// Scales every critical-hit threshold (0 disables crits)
    luck_multiplier: f32,
    /// Chance that a spawned enemy rolls a mutation
    mutation_chance: f32,
    pub features: FeatureFlags,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_preset(Preset::Normal)
    }
}

impl Settings {
    /// Create settings from a preset (applies preset defaults)
    pub fn from_preset(preset: Preset) -> Self {
        let mut features = FeatureFlags::default();
        features.comeback = preset.comeback_enabled();
        Self {
            preset,
            manual_speed: preset.manual_speed(),
            luck_multiplier: preset.luck(),
            mutation_chance: DEFAULT_MUTATION_CHANCE,
            features,
        }
    }

    /// Apply a preset (updates preset-dependent settings, keeps the rest)
    pub fn apply_preset(&mut self, preset: Preset) {
        self.preset = preset;
        self.set_manual_speed(preset.manual_speed());
        self.set_luck_multiplier(preset.luck());
        self.features.comeback = preset.comeback_enabled();
    }

    pub fn manual_speed(&self) -> f32 {
        self.manual_speed
    }

    pub fn set_manual_speed(&mut self, speed: f32) {
        self.manual_speed = clamp_or(speed, MIN_MANUAL_SPEED, MAX_MANUAL_SPEED, 1.0);
    }

    pub fn luck_multiplier(&self) -> f32 {
        self.luck_multiplier
    }

    pub fn set_luck_multiplier(&mut self, luck: f32) {
        self.luck_multiplier = clamp_or(luck, 0.0, MAX_LUCK, 1.0);
    }

    pub fn mutation_chance(&self) -> f32 {
        self.mutation_chance
    }

    pub fn set_mutation_chance(&mut self, chance: f32) {
        self.mutation_chance = clamp_or(chance, 0.0, 1.0, DEFAULT_MUTATION_CHANCE);
    }

    pub fn enabled(&self, feature: Feature) -> bool {
        self.features.get(feature)
    }

    pub fn set_feature(&mut self, feature: Feature, enabled: bool) {
        let slot = self.features.slot_mut(feature);
        if *slot != enabled {
            log::info!("Feature {feature:?} -> {enabled}");
        }
        *slot = enabled;
    }

    /// Parse and validate settings JSON. Missing fields take defaults;
    /// out-of-range numbers are rejected rather than clamped.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        check_range("manual_speed", self.manual_speed, MIN_MANUAL_SPEED, MAX_MANUAL_SPEED)?;
        check_range("luck_multiplier", self.luck_multiplier, 0.0, MAX_LUCK)?;
        check_range("mutation_chance", self.mutation_chance, 0.0, 1.0)?;
        Ok(())
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}

fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        log::warn!("Ignoring NaN setting, using {fallback}");
        return fallback;
    }
    value.clamp(min, max)
}

fn check_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), SettingsError> {
    if value.is_nan() || value < min || value > max {
        return Err(SettingsError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}
