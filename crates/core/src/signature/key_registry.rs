//! HSM key-label registry.
//!
//! Maps (signing role, application position type) to the HSM key label.
//! Built once at startup and never mutated.

use std::collections::HashMap;

use permitflow_shared::config::KeyLabelEntry;

use crate::workflow::error::WorkflowError;
use crate::workflow::types::{OfficerRole, PositionType};

/// Immutable key-label lookup table.
#[derive(Debug, Clone, Default)]
pub struct KeyLabelRegistry {
    labels: HashMap<(OfficerRole, PositionType), String>,
}

impl KeyLabelRegistry {
    /// An empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with a label for every role and position, e.g. `PF-CE-ARCH`.
    #[must_use]
    pub fn with_defaults() -> Self {
        let labels = OfficerRole::ALL
            .into_iter()
            .flat_map(|role| {
                PositionType::ALL.into_iter().map(move |position| {
                    (
                        (role, position),
                        format!("PF-{}-{}", role.abbreviation(), position.abbreviation()),
                    )
                })
            })
            .collect();
        Self { labels }
    }

    /// Returns a copy with configured entries replacing existing ones.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for unknown role or position codes or blank labels.
    pub fn with_overrides(mut self, entries: &[KeyLabelEntry]) -> Result<Self, WorkflowError> {
        for entry in entries {
            let role = OfficerRole::parse(&entry.officer_role).ok_or_else(|| {
                WorkflowError::Validation(format!("unknown officer role '{}'", entry.officer_role))
            })?;
            let position = PositionType::parse(&entry.position_type).ok_or_else(|| {
                WorkflowError::Validation(format!(
                    "unknown position type '{}'",
                    entry.position_type
                ))
            })?;
            if entry.key_label.trim().is_empty() {
                return Err(WorkflowError::Validation(format!(
                    "blank key label for {role}/{position}"
                )));
            }
            self.labels
                .insert((role, position), entry.key_label.trim().to_string());
        }
        Ok(self)
    }

    /// Looks up the key label.
    ///
    /// # Errors
    ///
    /// Returns `MissingKeyLabel` if nothing is configured.
    pub fn lookup(&self, role: OfficerRole, position: PositionType) -> Result<&str, WorkflowError> {
        self.labels
            .get(&(role, position))
            .map(String::as_str)
            .ok_or(WorkflowError::MissingKeyLabel { role, position })
    }

    /// Number of configured labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns true if no label is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(role: &str, position: &str, label: &str) -> KeyLabelEntry {
        KeyLabelEntry {
            officer_role: role.to_string(),
            position_type: position.to_string(),
            key_label: label.to_string(),
        }
    }

    #[test]
    fn test_defaults_cover_every_pair() {
        let registry = KeyLabelRegistry::with_defaults();
        assert_eq!(registry.len(), 25);
        assert_eq!(
            registry
                .lookup(OfficerRole::AssistantEngineer, PositionType::Supervisor1)
                .unwrap(),
            "PF-AE-SUP1"
        );
    }

    #[test]
    fn test_overrides_replace_defaults() {
        let registry = KeyLabelRegistry::with_defaults()
            .with_overrides(&[entry("city_engineer", "architect", "HSM-CE-01")])
            .unwrap();
        assert_eq!(
            registry
                .lookup(OfficerRole::CityEngineer, PositionType::Architect)
                .unwrap(),
            "HSM-CE-01"
        );
        assert_eq!(registry.len(), 25);
    }

    #[test]
    fn test_missing_label() {
        let registry = KeyLabelRegistry::empty()
            .with_overrides(&[entry("clerk", "architect", "CLERK-1")])
            .unwrap();
        assert!(matches!(
            registry.lookup(OfficerRole::Clerk, PositionType::Supervisor2),
            Err(WorkflowError::MissingKeyLabel { .. })
        ));
    }

    #[test]
    fn test_invalid_entries_rejected() {
        assert!(
            KeyLabelRegistry::empty()
                .with_overrides(&[entry("admin", "architect", "X")])
                .is_err()
        );
        assert!(
            KeyLabelRegistry::empty()
                .with_overrides(&[entry("clerk", "pilot", "X")])
                .is_err()
        );
        assert!(
            KeyLabelRegistry::empty()
                .with_overrides(&[entry("clerk", "architect", "  ")])
                .is_err()
        );
    }
}
