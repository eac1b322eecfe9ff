use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::{Region, RegionCode};

/// The marketplaces a user can pick from.
///
/// The pipeline treats region codes as opaque; the catalog only decides what
/// is offered and how it is labelled.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegionCatalog {
    pub regions: Vec<Region>,
}

impl RegionCatalog {
    /// Canada and the United States.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            regions: vec![
                Region::new("\u{1f1e8}\u{1f1e6} Canada", "CA"),
                Region::new("\u{1f1fa}\u{1f1f8} United States", "US"),
            ],
        }
    }

    /// Looks up a region by code, ignoring ASCII case.
    #[must_use]
    pub fn find(&self, code: &str) -> Option<&Region> {
        let code = code.trim();
        self.regions
            .iter()
            .find(|r| r.value.as_str().eq_ignore_ascii_case(code))
    }

    /// Resolves `code` to a catalog entry, falling back to an unlabelled
    /// region so unknown codes still pass through to the API.
    #[must_use]
    pub fn resolve(&self, code: &RegionCode) -> Region {
        self.find(code.as_str()).cloned().unwrap_or_else(|| Region {
            label: code.to_string(),
            value: code.clone(),
        })
    }

    /// Checks that the catalog is non-empty, has unique codes, and offers
    /// `default_region`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] describing the first problem found.
    pub fn validate(&self, default_region: &RegionCode) -> Result<(), ConfigError> {
        if self.regions.is_empty() {
            return Err(ConfigError::Validation(
                "region catalog must list at least one region".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for region in &self.regions {
            let code = region.value.as_str().trim();
            if code.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "region '{}' has an empty code",
                    region.label
                )));
            }
            if !seen.insert(code.to_ascii_uppercase()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate region code: '{code}'"
                )));
            }
        }

        if self.find(default_region.as_str()).is_none() {
            return Err(ConfigError::Validation(format!(
                "default region '{default_region}' is not in the region catalog"
            )));
        }

        Ok(())
    }
}

/// Load and validate a region catalog from a YAML file.
///
/// ```yaml
/// regions:
///   - value: CA
///     label: "🇨🇦 Canada"
/// ```
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_regions(path: &Path, default_region: &RegionCode) -> Result<RegionCatalog, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::RegionsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let catalog: RegionCatalog = serde_yaml::from_str(&content)?;
    catalog.validate(default_region)?;

    Ok(catalog)
}
