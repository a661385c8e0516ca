use serde::{Deserialize, Serialize};

/// File names a drift check looks up at each reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    pub manifest_name: String,
    pub build_file_name: String,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            manifest_name: "pyproject.toml".to_string(),
            build_file_name: "Dockerfile".to_string(),
        }
    }
}

impl CheckConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_manifest_name(mut self, name: impl Into<String>) -> Self {
        self.manifest_name = name.into();
        self
    }

    pub fn with_build_file_name(mut self, name: impl Into<String>) -> Self {
        self.build_file_name = name.into();
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.manifest_name.is_empty() {
            return Err("Manifest name cannot be empty".to_string());
        }

        if self.build_file_name.is_empty() {
            return Err("Build file name cannot be empty".to_string());
        }

        // Lookups are repository-relative; a leading separator would never
        // match a tree entry.
        if self.manifest_name.starts_with('/') || self.build_file_name.starts_with('/') {
            return Err("File names must be repository-relative".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CheckConfig::default();
        assert_eq!(config.manifest_name, "pyproject.toml");
        assert_eq!(config.build_file_name, "Dockerfile");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_overrides() {
        let config = CheckConfig::new()
            .with_manifest_name("services/api/pyproject.toml")
            .with_build_file_name("docker/Dockerfile.api");
        assert_eq!(config.manifest_name, "services/api/pyproject.toml");
        assert_eq!(config.build_file_name, "docker/Dockerfile.api");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_empty_names() {
        let config = CheckConfig::new().with_manifest_name("");
        assert!(config.validate().is_err());

        let config = CheckConfig::new().with_build_file_name("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_absolute_paths() {
        let config = CheckConfig::new().with_manifest_name("/etc/pyproject.toml");
        assert!(config.validate().is_err());
    }
}
