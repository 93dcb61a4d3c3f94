use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use wasim::config::{Config, StoreConfig};

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("wasim.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Configuration pointing both remote services at a mock server
#[allow(dead_code)]
pub fn mock_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.reply.base_url = base_url.to_string();
    config.store = StoreConfig {
        url: Some(base_url.to_string()),
        anon_key: Some("test-anon-key".to_string()),
        ..StoreConfig::default()
    };
    config
}
