//! Init command implementation

use clap::Args;
use omnilytics_core::{OmnilyticsConfig, OmnilyticsError, Result};
use std::path::PathBuf;

use crate::commands::{CliCommand, CommandContext};
use crate::config::{default_cookie_path, DEFAULT_CONFIG_FILE};

/// Write a starter Omnilytics configuration file
///
/// The file captures the effective configuration, so the global
/// `--service-url`, `--token`, `--organization` and `--cookie-file` flags
/// end up in it.
#[derive(Debug, Clone, Args)]
pub struct InitCommand {
    /// Where to write the configuration
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(short, long)]
    pub force: bool,
}

impl InitCommand {
    /// Configuration the command would write, based on `base`
    pub fn build_config(&self, base: &OmnilyticsConfig) -> Result<OmnilyticsConfig> {
        let mut config = base.clone();
        if config.cookies.path.is_none() {
            config.cookies.path = Some(default_cookie_path());
        }

        config.validate()?;
        Ok(config)
    }
}

impl CliCommand for InitCommand {
    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        if self.path.exists() && !self.force {
            return Err(OmnilyticsError::validation(format!(
                "Configuration already exists at {}. Use --force to overwrite.",
                self.path.display()
            )));
        }

        let config = self.build_config(&ctx.config)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        config.to_file(&self.path)?;
        tracing::info!("Wrote configuration to {}", self.path.display());

        let mut formatter = ctx.formatter();
        if formatter.is_human() {
            formatter.success(&format!(
                "Created configuration at {}",
                self.path.display()
            ))?;
            formatter.info(&format!(
                "Check it with: omnilytics validate {}",
                self.path.display()
            ))?;
        } else {
            formatter.output(&config)?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "init"
    }

    fn validate(&self) -> Result<()> {
        if self.path.is_dir() {
            return Err(OmnilyticsError::validation(format!(
                "{} is a directory",
                self.path.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use omnilytics_core::AnalyticsConfig;
    use url::Url;
    use tempfile::TempDir;

    fn context() -> CommandContext {
        let mut config = OmnilyticsConfig::default();
        config.analytics = AnalyticsConfig::new(Url::parse("https://ua.example.com").unwrap())
            .with_token("secret")
            .with_organization("acme");
        CommandContext::new(config, Default::default())
    }

    fn command(path: PathBuf) -> InitCommand {
        InitCommand { path, force: false }
    }

    #[test]
    fn test_build_config_fills_cookie_path() {
        let cmd = command(PathBuf::from(DEFAULT_CONFIG_FILE));
        let config = cmd.build_config(&context().config).unwrap();

        assert_eq!(
            config.analytics.service_url.as_str(),
            "https://ua.example.com/"
        );
        assert_eq!(config.analytics.token.as_deref(), Some("secret"));
        assert_eq!(config.cookies.path, Some(default_cookie_path()));
    }

    #[test]
    fn test_build_config_rejects_bad_scheme() {
        let mut base = OmnilyticsConfig::default();
        base.analytics.service_url = Url::parse("ftp://ua.example.com").unwrap();

        let cmd = command(PathBuf::from(DEFAULT_CONFIG_FILE));
        assert!(cmd.build_config(&base).is_err());
    }

    #[tokio::test]
    async fn test_init_writes_loadable_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("omnilytics.yaml");
        let mut ctx = context();
        ctx.config.cookies.path = Some(dir.path().join("jar.json"));

        command(path.clone()).execute(&ctx).await.unwrap();

        let config = OmnilyticsConfig::from_file(&path).unwrap();
        assert_eq!(config.analytics.organization.as_deref(), Some("acme"));
        assert_eq!(config.cookies.path, Some(dir.path().join("jar.json")));
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("omnilytics.yaml");
        std::fs::write(&path, "analytics: {}\n").unwrap();

        let mut cmd = command(path.clone());
        assert!(cmd.execute(&context()).await.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "analytics: {}\n");

        cmd.force = true;
        cmd.execute(&context()).await.unwrap();
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .contains("ua.example.com"));
    }

    #[test]
    fn test_validate_rejects_directory() {
        let dir = TempDir::new().unwrap();
        let cmd = command(dir.path().to_path_buf());
        assert!(cmd.validate().is_err());
    }
}
