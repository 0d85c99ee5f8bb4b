//! commodore-renovate - dependency extraction for Commodore configuration repositories

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod display;
mod error;
mod exit_codes;
mod logging;
mod util;

use commands::components::ConfigOverrides;
use display::OutputFormat;
use error::CliError;

#[derive(Parser)]
#[command(name = "commodore-renovate")]
#[command(author = "Project Syn Contributors")]
#[command(version)]
#[command(about = "Extract image, Helm chart and component dependencies from Commodore configuration", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract container images from configuration files
    Images {
        /// Files or directories to scan
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Only look at `parameters.<component>.images`
        #[arg(long)]
        shallow: bool,
    },

    /// Extract Helm chart versions of a component repository
    Helm {
        /// `class/defaults.yml` and `class/<component>.yml`
        #[arg(num_args = 2, required = true)]
        files: Vec<PathBuf>,
    },

    /// Extract component and package versions
    Components {
        /// Configuration file to extract from
        file: PathBuf,

        /// Manager configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Repository checkout the file belongs to
        #[arg(long)]
        local_dir: Option<PathBuf>,

        /// Tenant of the repository; makes it a tenant repository
        #[arg(long)]
        tenant_id: Option<String>,

        /// Global defaults repository to layer tenant files on
        #[arg(long)]
        global_repo_url: Option<String>,

        /// Lieutenant API URL
        #[arg(long, env = "LIEUTENANT_URL")]
        lieutenant_url: Option<String>,

        /// Extra config file, relative to the local directory
        #[arg(long)]
        extra_config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();
    logging::init_logging(cli.debug);

    let code = match run(cli).await {
        Ok(()) => exit_codes::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            code
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Images { paths, shallow } => commands::images::run(&paths, shallow, cli.format),

        Commands::Helm { files } => commands::helm::run(&files, cli.format),

        Commands::Components {
            file,
            config,
            local_dir,
            tenant_id,
            global_repo_url,
            lieutenant_url,
            extra_config,
        } => {
            let overrides = ConfigOverrides {
                config,
                local_dir,
                tenant_id,
                global_repo_url,
                lieutenant_url,
                extra_config,
            };
            commands::components::run(&file, overrides, cli.format).await
        }
    }
}
