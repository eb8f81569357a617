use clap::{Parser, Subcommand};
use rootcause::prelude::Report;
use std::path::PathBuf;
use std::process::ExitCode;
use taskdesk_cli::app::VERIFICATION_GRACE;
use taskdesk_cli::{App, CliConfig, CliError};
use taskdesk_platform_access::Registration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "taskdesk", version, about = "Terminal client for taskdesk")]
struct Args {
    /// Config file (defaults to ./taskdesk.toml when present)
    #[arg(long, env = "TASKDESK_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log gate decisions and backend calls to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in and continue to the page that asked for it
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Repeat of the password
        #[arg(long)]
        confirm: Option<String>,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Change the password of the signed-in user
    Passwd {
        #[arg(long)]
        current: String,
        #[arg(long = "new")]
        new_password: String,
    },
    /// Navigate to a page, e.g. `/tasks/42`
    Open { path: String },
    /// List the route tree with each page's access requirement
    Routes,
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(args: Args) -> Result<(), Report<CliError>> {
    let config = CliConfig::load(args.config.as_deref())?;
    tracing::debug!(
        base_url = %config.api.base_url,
        session = %config.session.path.display(),
        "loaded configuration"
    );

    let app = App::from_config(&config)?;
    let verification = app.start();

    let output = execute(&app, args.command).await;
    if let Ok(text) = &output {
        println!("{text}");
    }
    App::settle(verification, VERIFICATION_GRACE).await;
    output.map(|_| ())
}

async fn execute(app: &App, command: Command) -> Result<String, Report<CliError>> {
    match command {
        Command::Login { email, password } => app.login(&email, &password).await,
        Command::Register {
            name,
            email,
            password,
            confirm,
        } => {
            let mut registration = Registration::new(&name, &email, &password);
            if let Some(confirm) = confirm {
                registration = registration.with_confirmation(&confirm);
            }
            app.register(&registration).await
        }
        Command::Logout => app.logout().await,
        Command::Whoami => Ok(app.whoami()),
        Command::Passwd {
            current,
            new_password,
        } => app.change_password(&current, &new_password).await,
        Command::Open { path } => app.open(&path),
        Command::Routes => Ok(app.describe_routes()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            eprintln!("error: {report}");
            ExitCode::FAILURE
        }
    }
}
