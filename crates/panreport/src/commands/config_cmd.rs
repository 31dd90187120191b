//! Config subcommand handlers.

use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use panreport_config::{AppConfig, KeySource};
use panreport_core::{ConnectionSettings, ExportMode};

use crate::Context;
use crate::cli::{ConfigArgs, ConfigCommand, ConfigSetArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Debug, Serialize)]
struct ConfigView {
    config_file: PathBuf,
    settings_file: PathBuf,
    reports_dir: PathBuf,
    vault_key: KeySource,
    insecure: bool,
    ca_cert: Option<PathBuf>,
    timeout: u64,
    api_url: String,
    api_key_set: bool,
    max_rows: usize,
    format: ExportMode,
}

fn detail(view: &ConfigView) -> String {
    let optional = |p: &Option<PathBuf>| p.as_ref().map_or_else(|| "-".into(), |p| p.display().to_string());
    output::detail(&[
        ("config file", view.config_file.display().to_string()),
        ("settings file", view.settings_file.display().to_string()),
        ("reports dir", view.reports_dir.display().to_string()),
        ("vault key", format!("{:?}", view.vault_key).to_lowercase()),
        ("insecure tls", view.insecure.to_string()),
        ("ca cert", optional(&view.ca_cert)),
        ("timeout", format!("{}s", view.timeout)),
        (
            "api url",
            if view.api_url.is_empty() {
                "(not set)".into()
            } else {
                view.api_url.clone()
            },
        ),
        (
            "api key",
            if view.api_key_set { "********" } else { "(not set)" }.into(),
        ),
        ("max rows", view.max_rows.to_string()),
        ("format", view.format.to_string()),
    ])
}

/// `config path`: runs without loading settings.
pub fn print_paths(app: &AppConfig, global: &GlobalOpts) {
    let out = format!(
        "{}\n{}",
        panreport_config::config_path().display(),
        app.settings_path().display()
    );
    output::print_output(&out, global.quiet);
}

pub async fn handle(args: ConfigArgs, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let settings = ctx.session.settings().await;
            let view = ConfigView {
                config_file: panreport_config::config_path(),
                settings_file: ctx.store.path().to_path_buf(),
                reports_dir: ctx.app.reports_dir.clone(),
                vault_key: ctx.app.vault_key,
                insecure: ctx.app.insecure,
                ca_cert: ctx.app.ca_cert.clone(),
                timeout: ctx.app.timeout,
                api_url: settings.base_url.clone(),
                api_key_set: !settings.api_key.expose_secret().is_empty(),
                max_rows: settings.max_rows,
                format: settings.format,
            };
            let out = output::render_single(&global.output, &view, detail, |v| v.api_url.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            print_paths(&ctx.app, global);
            Ok(())
        }

        ConfigCommand::Init => {
            let path = panreport_config::config_path();
            if path.exists()
                && !util::confirm(&format!("Overwrite {}?", path.display()), global.yes)?
            {
                return Ok(());
            }
            panreport_config::save_config(&ctx.app)?;
            if !global.quiet {
                eprintln!("Config written to {}", path.display());
            }
            Ok(())
        }

        ConfigCommand::Set(set) => set_settings(set, ctx, global).await,
    }
}

async fn set_settings(args: ConfigSetArgs, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let ConfigSetArgs {
        url,
        api_key,
        max_rows,
        format,
    } = args;

    if max_rows == Some(0) {
        return Err(CliError::Validation {
            field: "max-rows".into(),
            reason: "must be greater than zero".into(),
        });
    }

    // Only export preferences changed: keep URL and key as stored.
    if url.is_none() && api_key.is_none() {
        if max_rows.is_none() && format.is_none() {
            return Err(CliError::Validation {
                field: "config set".into(),
                reason: "nothing to change; pass --url, --api-key, --max-rows or --format".into(),
            });
        }
        ctx.session
            .set_report_config(&ctx.store, max_rows, format.map(Into::into))
            .await?;
        if !global.quiet {
            eprintln!("Report settings saved");
        }
        return Ok(());
    }

    let current = ctx.session.settings().await;
    let base_url = match url {
        Some(raw) => normalize_url(&raw)?,
        None => current.base_url.clone(),
    };
    let api_key = match api_key {
        Some(key) => SecretString::from(key),
        None => SecretString::from(rpassword::prompt_password("API key: ").map_err(util::prompt_err)?),
    };
    if api_key.expose_secret().is_empty() {
        return Err(CliError::Validation {
            field: "api-key".into(),
            reason: "API key cannot be empty".into(),
        });
    }

    let settings = ConnectionSettings {
        base_url,
        api_key,
        max_rows: max_rows.unwrap_or(current.max_rows),
        format: format.map_or(current.format, Into::into),
    };
    ctx.session.save_settings(&ctx.store, settings).await?;
    if !global.quiet {
        eprintln!("Settings saved to {}", ctx.store.path().display());
    }
    Ok(())
}

/// Validate a management URL and strip trailing slashes.
fn normalize_url(raw: &str) -> Result<String, CliError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed: url::Url = trimmed.parse().map_err(|_| CliError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(CliError::Validation {
            field: "url".into(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    Ok(trimmed.to_owned())
}
