mod cli;
mod commands;
mod error;
mod output;
mod progress;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use panreport_config::{AppConfig, FileSettingsStore};
use panreport_core::Session;

use crate::cli::{Cli, Command, ConfigCommand, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loaded configuration plus the session built from it.
pub struct Context {
    pub app: AppConfig,
    pub store: FileSettingsStore,
    pub session: Session,
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "panreport", &mut std::io::stdout());
            Ok(())
        }

        // Paths only; nothing is loaded.
        Command::Config(ref args) if matches!(args.command, ConfigCommand::Path) => {
            let app = load_app_config(&cli.global)?;
            commands::config_cmd::print_paths(&app, &cli.global);
            Ok(())
        }

        cmd => {
            let ctx = build_context(&cli.global, repairs_settings(&cmd))?;
            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &ctx, &cli.global).await
        }
    }
}

/// Load `config.toml` and apply CLI overrides.
fn load_app_config(global: &GlobalOpts) -> Result<AppConfig, CliError> {
    let mut app = panreport_config::load_config()?;
    if let Some(dir) = &global.reports_dir {
        app.reports_dir.clone_from(dir);
    }
    if let Some(file) = &global.settings {
        app.settings_file = Some(file.clone());
    }
    Ok(app)
}

/// Commands that must still run when the stored key cannot be decrypted:
/// showing settings, and replacing the key.
fn repairs_settings(cmd: &Command) -> bool {
    match cmd {
        Command::Config(args) => match &args.command {
            ConfigCommand::Show => true,
            ConfigCommand::Set(set) => set.url.is_some() || set.api_key.is_some(),
            ConfigCommand::Path | ConfigCommand::Init => false,
        },
        _ => false,
    }
}

fn build_context(global: &GlobalOpts, repair: bool) -> Result<Context, CliError> {
    let app = load_app_config(global)?;
    let store = app.settings_store()?;
    let settings = if repair {
        store.load_for_repair()?
    } else {
        store.load_or_default()?
    };
    let session = Session::new(app.session_config(settings))?;
    Ok(Context {
        app,
        store,
        session,
    })
}
