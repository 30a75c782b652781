mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "devkit",
    about = "Bootstrap and drive the containerized development environment",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .devkit/ or .git/)
    #[arg(long, global = true, env = "DEVKIT_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// One-time setup: env file, images, dependencies, database, migrations
    Setup {
        /// Give up waiting for the database after this many probe attempts
        #[arg(long)]
        max_attempts: Option<u32>,
    },

    /// Start all containers
    Up,

    /// Stop all containers
    Down {
        /// Also remove named volumes
        #[arg(long)]
        volumes: bool,
    },

    /// Rebuild container images
    Build,

    /// Restart all containers
    Restart,

    /// Show container logs
    Logs {
        /// Limit to one compose service
        service: Option<String>,

        /// Follow log output
        #[arg(long, short = 'f')]
        follow: bool,
    },

    /// Show setup state, roles, and running services
    Status,

    /// Open an interactive shell in a role's container (alias: <role>-shell)
    Shell { role: String },

    /// Run a command in a role's container (alias: <role>-exec ARGS...)
    Exec {
        role: String,

        /// Command and arguments to run
        #[arg(last = true, required = true)]
        args: Vec<String>,
    },

    /// Run a role's test suite (alias: <role>-test)
    Test { role: String },

    /// Remove containers, volumes, dependencies, and setup state (asks for confirmation)
    Clean,

    /// Simulate CI locally: wipe dependencies, reinstall, lint, analyse
    Ci,

    /// Verify the pre-commit hook auto-fixes formatting
    HookTest,

    /// Manage .devkit/config.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    #[command(external_subcommand)]
    External(Vec<String>),
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Setup { max_attempts } => cmd::setup::run(&root, max_attempts, cli.json),
        Commands::Up => cmd::lifecycle::up(&root),
        Commands::Down { volumes } => cmd::lifecycle::down(&root, volumes),
        Commands::Build => cmd::lifecycle::build(&root),
        Commands::Restart => cmd::lifecycle::restart(&root),
        Commands::Logs { service, follow } => {
            cmd::lifecycle::logs(&root, service.as_deref(), follow)
        }
        Commands::Status => cmd::status::run(&root, cli.json),
        Commands::Shell { role } => cmd::role::shell(&root, &role),
        Commands::Exec { role, args } => cmd::role::exec(&root, &role, &args),
        Commands::Test { role } => cmd::role::test(&root, &role),
        Commands::Clean => cmd::clean::run(&root),
        Commands::Ci => cmd::ci::run(&root),
        Commands::HookTest => cmd::ci::hook_test(&root),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::External(args) => cmd::role::run_alias(&root, &args),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
