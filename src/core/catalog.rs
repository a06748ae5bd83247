//! Exercise Catalog: id → definition registry
//!
//! Pure data loaded from TOML. A built-in catalog is embedded from
//! `assets/exercises.toml`; any other document with the same shape can
//! replace it.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{FormError, Result};
use crate::types::{ExerciseDefinition, ExerciseSummary};

const BUILTIN_CATALOG: &str = include_str!("../../assets/exercises.toml");

lazy_static! {
    /// Runs of whitespace, hyphens and underscores in a spoken or typed name
    static ref RE_SEPARATORS: Regex = Regex::new(r"[\s_-]+").unwrap();

    static ref BUILTIN: ExerciseCatalog =
        ExerciseCatalog::from_toml_str(BUILTIN_CATALOG).unwrap();
}

/// On-disk shape: a list of `[[exercise]]` tables
#[derive(Debug, Serialize, Deserialize)]
struct CatalogDocument {
    #[serde(default, rename = "exercise")]
    exercises: Vec<ExerciseDefinition>,
}

/// Immutable registry of exercise definitions, in document order
#[derive(Debug, Clone)]
pub struct ExerciseCatalog {
    exercises: Vec<ExerciseDefinition>,
}

impl ExerciseCatalog {
    /// The embedded default catalog
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// Build from definitions, validating them
    pub fn new(exercises: Vec<ExerciseDefinition>) -> Result<Self> {
        validate(&exercises)?;
        Ok(Self { exercises })
    }

    /// Parse a TOML catalog document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let doc: CatalogDocument = toml::from_str(content)?;
        debug!(count = doc.exercises.len(), "catalog parsed");
        Self::new(doc.exercises)
    }

    /// Load a TOML catalog file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Exact id lookup
    pub fn get(&self, id: &str) -> Option<&ExerciseDefinition> {
        self.exercises.iter().find(|e| e.id == id)
    }

    /// Resolve an id, display name or alias ("Push Ups", "push-up") to an
    /// exercise
    pub fn resolve(&self, name: &str) -> Option<&ExerciseDefinition> {
        if let Some(def) = self.get(name) {
            return Some(def);
        }
        let wanted = normalize(name);
        if wanted.is_empty() {
            return None;
        }
        self.exercises.iter().find(|e| {
            normalize(&e.id) == wanted
                || normalize(&e.name) == wanted
                || e.aliases.iter().any(|a| normalize(a) == wanted)
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.exercises.iter().map(|e| e.id.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExerciseDefinition> {
        self.exercises.iter()
    }

    pub fn summaries(&self) -> Vec<ExerciseSummary> {
        self.exercises.iter().map(ExerciseSummary::from).collect()
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    /// Check the rep bands every exercise ends up with once thresholds it
    /// leaves out are taken from `config`
    pub fn validate_with(&self, config: &EngineConfig) -> Result<()> {
        for def in &self.exercises {
            if let Some(reps) = &def.reps {
                let (high, low) = reps.thresholds(config);
                if !(high > low) {
                    return Err(invalid(format!(
                        "rep thresholds for '{}' resolve to high {} at or below low {}",
                        def.id, high, low
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for ExerciseCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Lowercase, trim and collapse separators to a single underscore
fn normalize(name: &str) -> String {
    RE_SEPARATORS
        .replace_all(name.trim().to_lowercase().as_str(), "_")
        .trim_matches('_')
        .to_string()
}

fn validate(exercises: &[ExerciseDefinition]) -> Result<()> {
    let mut seen = HashSet::new();
    for def in exercises {
        if def.id.is_empty() {
            return Err(invalid("exercise with empty id"));
        }
        if !seen.insert(def.id.as_str()) {
            return Err(invalid(format!("duplicate exercise id '{}'", def.id)));
        }
        if def.phases.is_empty() {
            return Err(invalid(format!("exercise '{}' has no phases", def.id)));
        }
        for phase in &def.phases {
            if phase.ranges.is_empty() {
                return Err(invalid(format!(
                    "phase '{}' of '{}' has no angle ranges",
                    phase.name, def.id
                )));
            }
            for range in &phase.ranges {
                if !(range.min <= range.max) {
                    return Err(invalid(format!(
                        "range for '{}' in '{}/{}' has min {} above max {}",
                        range.angle, def.id, phase.name, range.min, range.max
                    )));
                }
            }
        }
        let mut rule_ids = HashSet::new();
        for rule in &def.mistakes {
            if !rule_ids.insert(rule.id.as_str()) {
                return Err(invalid(format!(
                    "duplicate mistake id '{}' in '{}'",
                    rule.id, def.id
                )));
            }
        }
        if let Some(reps) = &def.reps {
            if let (Some(high), Some(low)) = (reps.high, reps.low) {
                if !(high > low) {
                    return Err(invalid(format!(
                        "rep thresholds for '{}' need high {} above low {}",
                        def.id, high, low
                    )));
                }
            }
        }
    }
    Ok(())
}

fn invalid(msg: impl Into<String>) -> FormError {
    FormError::InvalidCatalog(msg.into())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_all_exercises() {
        let catalog = ExerciseCatalog::builtin();
        for id in [
            "shoulder_press", "squat", "bicep_curl", "pushup", "lunge", "plank",
            "lateral_raise", "deadlift",
        ] {
            assert!(catalog.contains(id), "missing {}", id);
        }
        assert_eq!(catalog.len(), 8);
    }

    #[test]
    fn test_builtin_order_and_priorities() {
        let catalog = ExerciseCatalog::builtin();
        let press = catalog.get("shoulder_press").unwrap();
        assert_eq!(
            press.feedback_priority(),
            vec!["Stack wrists over elbows", "Keep elbows even", "Don't arch your back"]
        );
        let squat = catalog.get("squat").unwrap();
        assert_eq!(squat.phases[0].name, "STANDING");
        assert_eq!(squat.phases[1].name, "BOTTOM");
        assert!(catalog.get("plank").unwrap().reps.is_none());
    }

    #[test]
    fn test_resolve_aliases() {
        let catalog = ExerciseCatalog::builtin();
        assert_eq!(catalog.resolve("Push Ups").unwrap().id, "pushup");
        assert_eq!(catalog.resolve("push-up").unwrap().id, "pushup");
        assert_eq!(catalog.resolve("  Military   Press ").unwrap().id, "shoulder_press");
        assert_eq!(catalog.resolve("Bicep Curl").unwrap().id, "bicep_curl");
        assert_eq!(catalog.resolve("squat").unwrap().id, "squat");
        assert!(catalog.resolve("jumping jacks").is_none());
        assert!(catalog.resolve("   ").is_none());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Push - Ups"), "push_ups");
        assert_eq!(normalize("_lateral_raise_"), "lateral_raise");
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let toml = r#"
            [[exercise]]
            id = "a"
            name = "A"
            [[exercise.phase]]
            name = "P"
            ranges = [{ angle = "left_knee", min = 0.0, max = 10.0 }]

            [[exercise]]
            id = "a"
            name = "A again"
            [[exercise.phase]]
            name = "P"
            ranges = [{ angle = "left_knee", min = 0.0, max = 10.0 }]
        "#;
        let result = ExerciseCatalog::from_toml_str(toml);
        assert!(matches!(result, Err(FormError::InvalidCatalog(_))));
    }

    #[test]
    fn test_rejects_inverted_range() {
        let toml = r#"
            [[exercise]]
            id = "a"
            name = "A"
            [[exercise.phase]]
            name = "P"
            ranges = [{ angle = "left_knee", min = 90.0, max = 10.0 }]
        "#;
        let result = ExerciseCatalog::from_toml_str(toml);
        assert!(matches!(result, Err(FormError::InvalidCatalog(_))));
    }

    #[test]
    fn test_rejects_missing_phases() {
        let toml = r#"
            [[exercise]]
            id = "a"
            name = "A"
            phase = []
        "#;
        let result = ExerciseCatalog::from_toml_str(toml);
        assert!(matches!(result, Err(FormError::InvalidCatalog(_))));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let result = ExerciseCatalog::from_toml_str("[[exercise]\nid = ");
        assert!(matches!(result, Err(FormError::Toml(_))));
    }

    #[test]
    fn test_builtin_bands_valid_under_defaults() {
        ExerciseCatalog::builtin()
            .validate_with(&EngineConfig::default())
            .unwrap();
    }

    #[test]
    fn test_partial_rep_override_checked_against_config() {
        let toml = r#"
[[exercise]]
id = "raise"
name = "Raise"
reps = { angle = "avg_arm_raise", high = 80.0 }

[[exercise.phase]]
name = "UP"
ranges = [{ angle = "avg_arm_raise", min = 80.0, max = 100.0 }]
"#;
        // Parses on its own: only one threshold is given
        let catalog = ExerciseCatalog::from_toml_str(toml).unwrap();

        // Default low of 90 leaves high 80 below it
        let result = catalog.validate_with(&EngineConfig::default());
        assert!(matches!(result, Err(FormError::InvalidCatalog(_))));

        let mut config = EngineConfig::default();
        config.rep_low_threshold_degrees = 30.0;
        assert!(catalog.validate_with(&config).is_ok());
    }
}
