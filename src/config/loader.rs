use std::path::Path;

use config::{Config, File, FileFormat};
use eyre::{Context, Result};

use crate::config::{models::RouterConfig, validation::RouterConfigValidator};

/// Load and validate configuration from a file using the config crate
/// Supports multiple formats: YAML, JSON, TOML, etc.
pub async fn load_config(config_path: &str) -> Result<RouterConfig> {
    let router_config = load_config_sync(config_path)?;
    RouterConfigValidator::validate(&router_config)
        .with_context(|| format!("Invalid router config in {config_path}"))?;
    Ok(router_config)
}

/// Load configuration synchronously, without validation
pub fn load_config_sync(config_path: &str) -> Result<RouterConfig> {
    let config_path = Path::new(config_path);

    // Determine file format based on extension
    let format = match config_path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => FileFormat::Yaml,
        Some("json") => FileFormat::Json,
        Some("toml") => FileFormat::Toml,
        _ => FileFormat::Yaml, // Default to YAML
    };

    let settings = Config::builder()
        .add_source(File::new(
            config_path
                .to_str()
                .ok_or_else(|| eyre::eyre!("Invalid UTF-8 path: {}", config_path.display()))?,
            format,
        ))
        .build()
        .with_context(|| format!("Failed to build config from {}", config_path.display()))?;

    let router_config: RouterConfig = settings.try_deserialize().with_context(|| {
        format!(
            "Failed to deserialize config from {}",
            config_path.display()
        )
    })?;

    Ok(router_config)
}

/// Load configuration without validation (used for validation command)
pub async fn load_config_unchecked(config_path: &str) -> Result<RouterConfig> {
    load_config_sync(config_path)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::config::models::RouterMode;

    #[tokio::test]
    async fn test_load_yaml_config() {
        let yaml_content = r#"
mode: single_shot
middleware:
  - Audit
groups:
  - name: api
    prefix: /api
    priority_middleware:
      - Auth
routes:
  - method: GET
    path: "/users/{id:int}"
    handler: "Users::show"
    groups: [api]
  - method: ANY
    path: /health
    handler: Health
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml_content).unwrap();

        let config = load_config(temp_file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(config.mode, RouterMode::SingleShot);
        assert_eq!(config.routes.len(), 2);
        assert_eq!(config.groups[0].priority_middleware, vec!["Auth".to_string()]);
        assert_eq!(config.wildcard_method, "ANY");
    }

    #[tokio::test]
    async fn test_load_json_config() {
        let json_content = r#"
{
  "routes": [
    { "method": "POST", "path": "/items", "handler": "Items::create" }
  ],
  "logging": { "level": "debug", "json": true }
}
"#;

        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        write!(temp_file, "{}", json_content).unwrap();

        let config = load_config(temp_file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(config.mode, RouterMode::Persistent);
        assert_eq!(config.routes[0].handler, "Items::create");
        assert!(config.logging.json);
    }

    #[tokio::test]
    async fn test_invalid_config_fails_validation() {
        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        write!(temp_file, "routes: []\n").unwrap();

        assert!(load_config(temp_file.path().to_str().unwrap()).await.is_err());
        assert!(
            load_config_unchecked(temp_file.path().to_str().unwrap())
                .await
                .is_ok()
        );
    }
}
