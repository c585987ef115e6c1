//! nw-install - installer for the Naturewatch camera server.
//!
//! Installs OS and Python dependencies, copies the camera server tree to
//! the installation path, renders its systemd units and starts them.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

use nw_install::commands::{self, show::ShowTarget as ShowCmd, InstallArgs};
use nw_install::config::Config;
use nw_install::error::InstallError;
use nw_install::process::failed_exit_code;
use nw_install::telemetry;

#[derive(Parser)]
#[command(name = "nw-install")]
#[command(about = "Naturewatch camera server installer")]
#[command(args_conflicts_with_subcommands = true)]
#[command(
    after_help = "QUICK START:\n  nw-install preflight     Check the host before installing\n  nw-install /opt/app      Install into /opt/app\n  nw-install status        Show service state"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Installation directory (same as `nw-install install <PATH>`)
    install_path: Option<PathBuf>,

    /// Installer tree (default: directory of this executable, symlinks resolved)
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Print every external command as it runs
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Install packages, copy files, and register the services
    Install {
        /// Installation directory
        install_path: PathBuf,

        /// Skip OS and Python package installation
        #[arg(long)]
        skip_packages: bool,

        /// Do not re-run through sudo when not root
        #[arg(long)]
        no_elevate: bool,
    },

    /// Run preflight checks (verify host tools and installer tree)
    Preflight {
        /// Exit non-zero if any check fails
        #[arg(long)]
        strict: bool,
    },

    /// Render the service units for a path without installing
    Render {
        /// Installation directory to substitute
        install_path: PathBuf,

        /// Write units into this directory instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show information
    Show {
        #[command(subcommand)]
        what: ShowTarget,
    },

    /// Show whether the managed services are running
    Status,
}

#[derive(Subcommand)]
enum ShowTarget {
    /// Show current configuration
    Config,
    /// Show managed units and their destinations
    Units,
}

fn main() {
    let cli = Cli::parse();
    telemetry::init(cli.verbose);

    let code = match cli.command {
        None => match cli.install_path {
            Some(install_path) => install(InstallArgs {
                install_path,
                source: cli.source,
                skip_packages: false,
                no_elevate: false,
            }),
            None => {
                let _ = Cli::command().print_help();
                2
            }
        },
        Some(Commands::Install {
            install_path,
            skip_packages,
            no_elevate,
        }) => install(InstallArgs {
            install_path,
            source: cli.source,
            skip_packages,
            no_elevate,
        }),
        Some(command) => match run_command(command, cli.source) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                failed_exit_code(&e).filter(|c| *c != 0).unwrap_or(1)
            }
        },
    };

    std::process::exit(code);
}

fn install(args: InstallArgs) -> i32 {
    let argv: Vec<OsString> = std::env::args_os().collect();
    match commands::cmd_install(&args, &argv) {
        Ok(code) => code,
        Err(e) => {
            report_install_error(&e);
            e.exit_code()
        }
    }
}

fn report_install_error(err: &InstallError) {
    eprintln!("\nError ({}): {}", err.stage(), err);
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        eprintln!("  caused by: {}", cause);
        source = std::error::Error::source(cause);
    }
    eprintln!("\nRe-run the same command to resume; every stage is safe to repeat.");
}

fn run_command(command: Commands, source: Option<PathBuf>) -> Result<i32> {
    let source_dir = commands::resolve_source(source.as_deref())?;
    let config = Config::load(&source_dir);

    match command {
        Commands::Preflight { strict } => {
            commands::cmd_preflight(&source_dir, &config, strict)?;
        }

        Commands::Render {
            install_path,
            output,
        } => {
            commands::cmd_render(&source_dir, install_path, output.as_deref())?;
        }

        Commands::Show { what } => {
            let show_target = match what {
                ShowTarget::Config => ShowCmd::Config,
                ShowTarget::Units => ShowCmd::Units,
            };
            commands::cmd_show(&source_dir, show_target, &config)?;
        }

        Commands::Status => {
            if !commands::cmd_status(&config)? {
                return Ok(3);
            }
        }

        Commands::Install { .. } => unreachable!("install is dispatched before run_command"),
    }

    Ok(0)
}
