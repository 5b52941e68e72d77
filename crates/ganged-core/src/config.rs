//! Operator configuration: the power-curve parameters, the global
//! processing mode and its per-type exclusions, consumable accounting
//! flags, and display passthroughs.
//!
//! The document lives in a JSON file owned by an external collaborator;
//! this module provides the typed object, load/save helpers, range
//! clamping, the version-stamp migration check, and the whole-percent
//! accessors the settings UI registers against. Loading follows the
//! JSON-string-in, typed-struct-out pattern, with `#[serde(default)]` on
//! every field so documents written by older versions still parse.

use crate::fixed::{Fixed64, f64_to_fixed64};
use crate::power;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Version stamp
// ---------------------------------------------------------------------------

/// The running core version, stamped into freshly written config documents.
pub const CURRENT_VERSION: Version = Version {
    major: 1,
    minor: 0,
    patch: 0,
};

/// A semantic version triple, persisted as a `"major.minor.patch"` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid version string: {0:?}")]
pub struct VersionParseError(String);

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl From<Version> for String {
    fn from(v: Version) -> Self {
        v.to_string()
    }
}

impl std::str::FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        let mut next = || {
            parts
                .next()
                .and_then(|p| p.parse::<u32>().ok())
                .ok_or_else(|| VersionParseError(s.to_string()))
        };
        let version = Version {
            major: next()?,
            minor: next()?,
            patch: next()?,
        };
        if parts.next().is_some() {
            return Err(VersionParseError(s.to_string()));
        }
        Ok(version)
    }
}

impl TryFrom<String> for Version {
    type Error = VersionParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

// ---------------------------------------------------------------------------
// Processing mode
// ---------------------------------------------------------------------------

/// How the throughput multiplier is applied to a production cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingMode {
    /// Scale output quantity per cycle, duration untouched.
    MultiplyItems,
    /// Shrink cycle duration, output quantity untouched.
    IncreaseSpeed,
}

impl ProcessingMode {
    pub fn opposite(self) -> Self {
        match self {
            ProcessingMode::MultiplyItems => ProcessingMode::IncreaseSpeed,
            ProcessingMode::IncreaseSpeed => ProcessingMode::MultiplyItems,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProcessingMode::MultiplyItems => "MultiplyItems",
            ProcessingMode::IncreaseSpeed => "IncreaseSpeed",
        }
    }
}

// ---------------------------------------------------------------------------
// Modifier keys
// ---------------------------------------------------------------------------

/// Keyboard modifier keys recognized by the combine input trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierKey {
    LeftControl,
    RightControl,
    LeftShift,
    RightShift,
    LeftAlt,
    RightAlt,
}

impl std::str::FromStr for ModifierKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LeftControl" => Ok(ModifierKey::LeftControl),
            "RightControl" => Ok(ModifierKey::RightControl),
            "LeftShift" => Ok(ModifierKey::LeftShift),
            "RightShift" => Ok(ModifierKey::RightShift),
            "LeftAlt" => Ok(ModifierKey::LeftAlt),
            "RightAlt" => Ok(ModifierKey::RightAlt),
            _ => Err(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error("unknown processing mode: {0:?}")]
    UnknownMode(String),
}

// ---------------------------------------------------------------------------
// ModConfig
// ---------------------------------------------------------------------------

fn default_penalty() -> f64 {
    0.03
}
fn default_minimum_effect() -> f64 {
    0.25
}
fn default_mode() -> ProcessingMode {
    ProcessingMode::MultiplyItems
}
fn default_true() -> bool {
    true
}
fn default_opacity() -> f64 {
    1.0
}
fn default_combine_keys() -> Vec<String> {
    vec!["LeftControl".to_string(), "RightControl".to_string()]
}
fn default_version() -> Version {
    CURRENT_VERSION
}

/// The process-wide configuration object. Replaced atomically as a whole
/// on hot reload; never mutated field-by-field from the outside except
/// through the settings-UI accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ModConfig {
    /// Per-additional-machine power decay step, fraction in [0, 1].
    pub combine_penalty: f64,
    /// Floor on each machine's marginal contribution, fraction in [0, 1].
    pub minimum_effect: f64,
    /// Global default effect mode.
    pub processing_mode: ProcessingMode,
    /// Machine type names that use the opposite of the global mode.
    /// Case-sensitive exact match.
    pub processing_mode_exclusions: Vec<String>,
    /// In MultiplyItems mode, scale a furnace-style cycle's consumable
    /// input 1:1 with the scaled output instead of charging exactly one.
    pub furnace_multiply_coal_inputs: bool,
    /// Display passthroughs, read by the render collaborator only.
    pub draw_tool_tip: bool,
    pub tool_tip_show_duration: bool,
    pub tool_tip_show_quantity: bool,
    /// Opacity of the overlaid quantity digits, [0, 1].
    pub number_opacity: f64,
    /// Key names that arm the combine trigger while held.
    pub combine_key_names: Vec<String>,
    /// Version stamp of the core that wrote this document.
    pub created_by_version: Version,
}

impl Default for ModConfig {
    fn default() -> Self {
        Self {
            combine_penalty: default_penalty(),
            minimum_effect: default_minimum_effect(),
            processing_mode: default_mode(),
            processing_mode_exclusions: Vec::new(),
            furnace_multiply_coal_inputs: true,
            draw_tool_tip: default_true(),
            tool_tip_show_duration: default_true(),
            tool_tip_show_quantity: default_true(),
            number_opacity: default_opacity(),
            combine_key_names: default_combine_keys(),
            created_by_version: default_version(),
        }
    }
}

impl ModConfig {
    // -----------------------------------------------------------------------
    // Mode resolution
    // -----------------------------------------------------------------------

    /// The effective processing mode for a machine type: the opposite of the
    /// global mode when the type name is excluded, otherwise the global mode.
    pub fn effective_mode(&self, machine_type_name: &str) -> ProcessingMode {
        if self
            .processing_mode_exclusions
            .iter()
            .any(|name| name == machine_type_name)
        {
            self.processing_mode.opposite()
        } else {
            self.processing_mode
        }
    }

    // -----------------------------------------------------------------------
    // Power curve parameters
    // -----------------------------------------------------------------------

    pub fn penalty_fixed(&self) -> Fixed64 {
        f64_to_fixed64(self.combine_penalty)
    }

    pub fn minimum_effect_fixed(&self) -> Fixed64 {
        f64_to_fixed64(self.minimum_effect)
    }

    /// Throughput multiplier for a combined quantity under this config.
    pub fn processing_power(&self, quantity: u32) -> Fixed64 {
        power::compute_power(quantity, self.penalty_fixed(), self.minimum_effect_fixed())
    }

    // -----------------------------------------------------------------------
    // Modifier keys
    // -----------------------------------------------------------------------

    /// Parse the configured key names. Unknown names are dropped with a
    /// warning that lists both the rejected and the accepted entries.
    pub fn modifier_keys(&self) -> Vec<ModifierKey> {
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        for name in &self.combine_key_names {
            match name.parse::<ModifierKey>() {
                Ok(key) => accepted.push(key),
                Err(()) => rejected.push(name.clone()),
            }
        }
        if !rejected.is_empty() {
            tracing::warn!(
                rejected = ?rejected,
                accepted = ?accepted,
                "ignoring unrecognized combine key names"
            );
        }
        accepted
    }

    // -----------------------------------------------------------------------
    // Settings-UI accessors (whole-percent / text views over the fields)
    // -----------------------------------------------------------------------

    /// Combine penalty as a whole percent, 0..=10.
    pub fn penalty_percent(&self) -> u32 {
        (self.combine_penalty * 100.0).round() as u32
    }

    pub fn set_penalty_percent(&mut self, percent: u32) {
        self.combine_penalty = f64::from(percent.min(10)) / 100.0;
    }

    /// Minimum effect as a whole percent, 0..=100.
    pub fn minimum_effect_percent(&self) -> u32 {
        (self.minimum_effect * 100.0).round() as u32
    }

    pub fn set_minimum_effect_percent(&mut self, percent: u32) {
        self.minimum_effect = f64::from(percent.min(100)) / 100.0;
    }

    pub fn mode_text(&self) -> &'static str {
        self.processing_mode.as_str()
    }

    pub fn set_mode_text(&mut self, text: &str) -> Result<(), ConfigError> {
        self.processing_mode = match text {
            "MultiplyItems" => ProcessingMode::MultiplyItems,
            "IncreaseSpeed" => ProcessingMode::IncreaseSpeed,
            other => return Err(ConfigError::UnknownMode(other.to_string())),
        };
        Ok(())
    }

    pub fn exclusions_csv(&self) -> String {
        self.processing_mode_exclusions.join(",")
    }

    pub fn set_exclusions_csv(&mut self, csv: &str) {
        self.processing_mode_exclusions = csv
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    }

    // -----------------------------------------------------------------------
    // Sanitization and migration
    // -----------------------------------------------------------------------

    /// Clamp numeric fields to their documented ranges. Out-of-range values
    /// are an operator editing mistake, not an error.
    pub fn sanitize(&mut self) {
        for (field, value, lo, hi) in [
            ("CombinePenalty", &mut self.combine_penalty, 0.0, 1.0),
            ("MinimumEffect", &mut self.minimum_effect, 0.0, 1.0),
            ("NumberOpacity", &mut self.number_opacity, 0.0, 1.0),
        ] {
            let clamped = value.clamp(lo, hi);
            if clamped != *value || value.is_nan() {
                let clamped = if value.is_nan() { lo } else { clamped };
                tracing::warn!(field, from = *value, to = clamped, "clamped config value");
                *value = clamped;
            }
        }
    }

    /// Bump an older version stamp to the running version. Returns true if
    /// the stamp changed, signalling the file collaborator to rewrite the
    /// document.
    pub fn migrate(&mut self) -> bool {
        if self.created_by_version < CURRENT_VERSION {
            tracing::info!(
                from = %self.created_by_version,
                to = %CURRENT_VERSION,
                "migrating configuration stamp"
            );
            self.created_by_version = CURRENT_VERSION;
            true
        } else {
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Parse a configuration document, clamp its ranges, and migrate the
/// version stamp. The external file collaborator owns the actual I/O.
pub fn load_config_json(json: &str) -> Result<ModConfig, ConfigError> {
    let mut config: ModConfig = serde_json::from_str(json)?;
    config.sanitize();
    config.migrate();
    Ok(config)
}

/// Serialize a configuration document for the file collaborator to write.
pub fn to_json_string(config: &ModConfig) -> Result<String, ConfigError> {
    Ok(serde_json::to_string_pretty(config)?)
}

// ===========================================================================
// Tests
// ===========================================================================
