//! Default configuration values
//!
//! Embedded in the binary and used by `ConfigLoader::load` when no config
//! file exists.

/// Default configuration as TOML
pub const DEFAULT_CONFIG_TOML: &str = r##"
# squeeze server configuration

[server]
bind = "0.0.0.0"
port = 8080
# 0 = one worker per available CPU
workers = 0
io_timeout_secs = 30

[storage]
compressed_dir = "./compressed"
decompressed_dir = "./decompressed"
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_default_toml_matches_default_struct() {
        let parsed: AppConfig = toml::from_str(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(parsed, AppConfig::default());
    }
}
