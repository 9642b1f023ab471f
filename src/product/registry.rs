//! Named collection of product profiles.

use super::builtin::builtin_profiles;
use super::config::ProductProfile;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Contents of a profile file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileFile {
    /// Profiles to add or override
    #[serde(default)]
    pub profiles: Vec<ProductProfile>,
}

/// Registry for product profiles, keyed by lowercase name.
#[derive(Debug, Clone)]
pub struct ProductRegistry {
    profiles: BTreeMap<String, ProductProfile>,
}

impl ProductRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            profiles: BTreeMap::new(),
        }
    }

    /// Create a registry holding the built-in profiles.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for profile in builtin_profiles() {
            registry.profiles.insert(profile.name.to_lowercase(), profile);
        }
        registry
    }

    /// Register a profile, replacing any profile of the same name.
    pub fn register(&mut self, profile: ProductProfile) -> Result<()> {
        profile.validate()?;
        let name = profile.name.to_lowercase();
        if self.profiles.contains_key(&name) {
            log::debug!("Overriding product profile {}", name);
        }
        self.profiles.insert(name, profile);
        Ok(())
    }

    /// Add the profiles of a JSON profile file.
    pub fn load_json(&mut self, json: &str) -> Result<usize> {
        let file: ProfileFile = serde_json::from_str(json)?;
        let count = file.profiles.len();
        for profile in file.profiles {
            self.register(profile)?;
        }
        Ok(count)
    }

    /// Add the profiles of a JSON profile file on disk.
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let count = self.load_json(&text)?;
        log::debug!("Loaded {} profiles from {}", count, path.display());
        Ok(count)
    }

    /// Get a profile by name.
    pub fn get(&self, name: &str) -> Result<&ProductProfile> {
        self.profiles
            .get(&name.to_lowercase())
            .ok_or_else(|| Error::UnknownProduct(name.to_string()))
    }

    /// Check if a profile exists.
    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(&name.to_lowercase())
    }

    /// All profiles, sorted by name.
    pub fn profiles(&self) -> impl Iterator<Item = &ProductProfile> {
        self.profiles.values()
    }

    /// All profile names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.profiles.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for ProductRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
