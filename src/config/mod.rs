use self::settings::BotSettings;
use crate::engine::FIELDS;
use crate::error::BotError;
use std::fs;
use std::path::Path;

pub mod creator;
pub mod exchange;
pub mod settings;

pub fn load_config(path: &str) -> Result<BotSettings, BotError> {
    let content = fs::read_to_string(path)?;
    let config: BotSettings = toml::from_str(&content)?;
    config
        .validate()
        .map_err(|e| BotError::ValidationError(e.to_string()))?;
    Ok(config)
}

pub fn save_config(path: &str, settings: &BotSettings) -> anyhow::Result<()> {
    let toml_string = toml::to_string_pretty(settings)?;
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, toml_string)?;
    Ok(())
}

pub fn print_field_help() {
    println!("Editable settings (use --set key=value):\n");
    for (key, description) in FIELDS {
        println!("  {:<26} {}", key, description);
    }
    println!();
    println!("Numeric values accept thousands separators, e.g. --set max_total_size=2,500");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ladder::types::Direction;
    use tempfile::tempdir;

    #[test]
    fn test_save_then_load_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("configs").join("btc.toml");
        let path = path.to_str().unwrap();

        let mut settings = BotSettings::with_defaults("BTCUSDT", Direction::Short, 65000.0);
        settings.reverse.enabled = true;
        settings.reverse.max_total_size = 250.0;
        save_config(path, &settings).unwrap();

        let loaded = load_config(path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_load_config_rejects_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(
            &path,
            "leverage = 0\nmax_total_size = 100.0\nfirst_entry_price = 10.0\nentry_count = 2\nprice_deviation = 1.0\n",
        )
        .unwrap();

        let err = load_config(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, BotError::ValidationError(_)));
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config("/nonexistent/settings.toml").unwrap_err();
        assert!(matches!(err, BotError::ConfigError(_)));
    }

    #[test]
    fn test_load_config_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "leverage = \"ten\"").unwrap();
        let err = load_config(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, BotError::ParsingError(_)));
    }
}
