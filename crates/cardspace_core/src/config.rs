//! Replica configuration.

/// Local storage key the replica is persisted under.
pub const DEFAULT_WORKSPACE_KEY: &str = "workspace-cards";

/// Configuration for opening a replica.
#[derive(Debug, Clone)]
pub struct Config {
    /// Key of the workspace blob in local storage.
    pub workspace_key: String,

    /// Whether to sync local storage after every persisted command
    /// (safer but slower).
    pub sync_on_write: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace_key: DEFAULT_WORKSPACE_KEY.to_string(),
            sync_on_write: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the workspace key.
    #[must_use]
    pub fn workspace_key(mut self, key: impl Into<String>) -> Self {
        self.workspace_key = key.into();
        self
    }

    /// Sets whether to sync storage after every write.
    #[must_use]
    pub fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.workspace_key, "workspace-cards");
        assert!(config.sync_on_write);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new().workspace_key("scratch").sync_on_write(false);

        assert_eq!(config.workspace_key, "scratch");
        assert!(!config.sync_on_write);
    }
}
