//! `chutney config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use chutney_core::config::ChutneyConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::commands::{ConfigOverrides, load_config};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

const SECTIONS: [&str; 4] = ["general", "server", "stream", "history"];

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    config_path: &Path,
    overrides: &ConfigOverrides,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(config_path, writer).await,
        ConfigAction::Show { section } => {
            execute_show(config_path, overrides, section, writer).await
        }
    }
}

/// Load and validate the configuration file, reporting any errors.
///
/// Unlike other commands, a missing file is reported as invalid.
async fn execute_validate(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %config_path.display(), "validating configuration");

    let report = match ChutneyConfig::load(config_path).await {
        Ok(_) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: true,
            errors: Vec::new(),
        },
        Err(e) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: false,
            errors: vec![e.to_string()],
        },
    };

    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }

    Ok(())
}

/// Display the effective configuration (file + env overrides + flags + defaults).
async fn execute_show(
    config_path: &Path,
    overrides: &ConfigOverrides,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let mut config = load_config(config_path, overrides).await?;
    redact_credentials(&mut config);

    let config_toml = match section.as_deref() {
        None => to_toml(&config),
        Some("general") => to_toml(&config.general),
        Some("server") => to_toml(&config.server),
        Some("stream") => to_toml(&config.stream),
        Some("history") => to_toml(&config.history),
        Some(other) => {
            return Err(CliError::Command(format!(
                "unknown section: {} (expected: {})",
                other,
                SECTIONS.join(", ")
            )));
        }
    };

    writer.render(&ConfigReport {
        source: config_path.display().to_string(),
        section,
        config: serde_json::to_value(&config)?,
        config_toml,
    })?;

    Ok(())
}

fn to_toml<T: Serialize>(value: &T) -> String {
    toml::to_string_pretty(value).unwrap_or_else(|e| format!("(serialization error: {})", e))
}

/// Hide the server password.
fn redact_credentials(config: &mut ChutneyConfig) {
    if config.server.password.is_some() {
        config.server.password = Some("***REDACTED***".to_owned());
    }
}

/// Configuration display report.
///
/// The `config_toml` field is only used for text rendering.
#[derive(Serialize)]
pub struct ConfigReport {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    pub config: serde_json::Value,
    #[serde(skip)]
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if let Some(ref section) = self.section {
            let section_label = format!("[{}]", section);
            writeln!(
                w,
                "Configuration {} (source: {})",
                section_label.bold(),
                self.source
            )?;
        } else {
            writeln!(w, "Configuration (source: {})", self.source.bold())?;
        }

        writeln!(w)?;
        write!(w, "{}", self.config_toml)?;

        Ok(())
    }
}

/// Configuration validation report.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    pub source: String,
    pub valid: bool,
    /// Validation error messages (empty if valid)
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config Validation: {}", self.source.bold())?;

        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_credentials() {
        let mut config = ChutneyConfig::default();
        config.server.username = Some("admin".to_owned());
        config.server.password = Some("s3cret".to_owned());

        redact_credentials(&mut config);

        assert_eq!(config.server.username.as_deref(), Some("admin"));
        assert_eq!(config.server.password.as_deref(), Some("***REDACTED***"));
        assert!(!to_toml(&config).contains("s3cret"));
    }

    #[test]
    fn test_redact_without_password_is_noop() {
        let mut config = ChutneyConfig::default();
        redact_credentials(&mut config);
        assert!(config.server.password.is_none());
    }

    #[test]
    fn test_config_report_render_text_section() {
        let report = ConfigReport {
            source: "chutney.toml".to_owned(),
            section: Some("history".to_owned()),
            config: serde_json::Value::Null,
            config_toml: "debounce_ms = 500\n".to_owned(),
        };

        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("text rendering should succeed");
        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("[history]"));
        assert!(output.contains("debounce_ms = 500"));
    }

    #[test]
    fn test_config_report_json_skips_toml() {
        let report = ConfigReport {
            source: "chutney.toml".to_owned(),
            section: None,
            config: serde_json::json!({"server": {"base_url": "http://localhost:8081"}}),
            config_toml: "[server]".to_owned(),
        };
        let json = serde_json::to_value(&report).expect("serializable");
        assert!(json.get("config_toml").is_none());
        assert_eq!(json["config"]["server"]["base_url"], "http://localhost:8081");
    }

    #[test]
    fn test_config_validation_report_invalid() {
        let report = ConfigValidationReport {
            source: "bad.toml".to_owned(),
            valid: false,
            errors: vec!["invalid config value for 'server.base_url'".to_owned()],
        };
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("text rendering should succeed");
        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("INVALID"));
        assert!(output.contains("server.base_url"));
    }

    #[tokio::test]
    async fn test_show_rejects_unknown_section() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("missing.toml");
        let writer = OutputWriter::new(crate::cli::OutputFormat::Json);

        let err = execute_show(
            &path,
            &ConfigOverrides::default(),
            Some("database".to_owned()),
            &writer,
        )
        .await
        .expect_err("unknown section");
        assert!(err.to_string().contains("unknown section: database"));
    }
}
