//! Config file generation command.

use shopping_cart_service::Config;
use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;

/// Renders `config` in the requested format.
pub fn render_config(config: &Config, format: &ConfigFormat) -> anyhow::Result<String> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Generates a configuration file with the default values.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> anyhow::Result<()> {
    let output = output.unwrap_or_else(|| PathBuf::from("shopping-cart-service.yaml"));

    let mut content = render_config(&Config::default(), &format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# Shopping Cart Service Configuration
# ===================================
#
# Server Configuration
# --------------------
# bind: "0.0.0.0"                # Bind IP (0.0.0.0 = all interfaces)
# port: 8080                     # HTTP port
# service_name: "shopping-cart-service"  # Reported by /health
#
# Metrics Collection
# ------------------
# collect_interval_secs: 5       # Seconds between cart gauge observations
#
# Feature Flags
# -------------
# enable_health: true            # Enable /health endpoint
# simulate_latency: true         # Add 0-100ms latency to 30% of requests
# simulate_traffic: true         # Run the built-in traffic generator
# traffic_start_delay_secs: 5    # Delay before generated traffic starts
#
# Logging
# -------
# log_level: "info"              # off, error, warn, info, debug, trace
"#;

    format!("{comments}\n{yaml}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopping_cart_service::config::parse_config;

    #[test]
    fn test_rendered_formats_parse_back() {
        let defaults = Config::default();
        for (format, ext) in [
            (ConfigFormat::Yaml, "yaml"),
            (ConfigFormat::Json, "json"),
            (ConfigFormat::Toml, "toml"),
        ] {
            let text = render_config(&defaults, &format).unwrap();
            assert_eq!(parse_config(&text, Some(ext)).unwrap(), defaults);
        }
    }

    #[test]
    fn test_command_writes_commented_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.yaml");

        command_config(Some(path.clone()), ConfigFormat::Yaml, true).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# Shopping Cart Service Configuration"));
        assert_eq!(
            parse_config(&written, Some("yaml")).unwrap(),
            Config::default()
        );
    }
}
