//! Quire CLI
//!
//! Static blog generator.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;
use color_eyre::eyre::Result;

/// Command-line interface for Quire.
#[derive(Parser)]
#[command(name = "quire", version, about = "A static blog generator")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "quire.toml")]
    config: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Build the static site
    Build {
        /// Output directory (defaults to build.output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Override site hostname (e.g., https://example.com)
        #[arg(long)]
        hostname: Option<String>,
    },
    /// Create a new dated post
    New {
        /// Post title
        title: String,
        /// Content section (defaults to the posts prefix)
        #[arg(short, long)]
        section: Option<String>,
        /// Publication date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Validate configuration and content
    Check {
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    quire::init_tracing(cli.verbose);

    match cli.command {
        Commands::Build { output, hostname } => {
            quire::cmd::build::run(&cli.config, output.as_deref(), hostname.as_deref())?;
        }
        Commands::New {
            title,
            section,
            date,
        } => {
            quire::cmd::new::run(&cli.config, &title, section.as_deref(), date)?;
        }
        Commands::Check { strict } => {
            quire::cmd::check::run(&cli.config, strict)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_cli_build_command_parsing() {
        let args = ["quire", "build", "--output", "dist"];
        let cli = Cli::parse_from(args);

        assert_eq!(cli.config, PathBuf::from("quire.toml"));
        assert_eq!(cli.verbose, 0);

        match cli.command {
            Commands::Build { output, hostname } => {
                assert_eq!(output, Some(PathBuf::from("dist")));
                assert!(hostname.is_none());
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_build_with_hostname() {
        let args = ["quire", "build", "--hostname", "https://staging.example.com"];
        let cli = Cli::parse_from(args);

        match cli.command {
            Commands::Build { output, hostname } => {
                assert!(output.is_none());
                assert_eq!(hostname.as_deref(), Some("https://staging.example.com"));
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_new_command_parsing() {
        let args = [
            "quire",
            "new",
            "Be Right, Nicely",
            "--section",
            "projects",
            "--date",
            "2024-01-26",
        ];
        let cli = Cli::parse_from(args);

        match cli.command {
            Commands::New {
                title,
                section,
                date,
            } => {
                assert_eq!(title, "Be Right, Nicely");
                assert_eq!(section.as_deref(), Some("projects"));
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 26));
            }
            _ => panic!("Expected New command"),
        }
    }

    #[test]
    fn test_cli_new_rejects_bad_date() {
        let args = ["quire", "new", "Title", "--date", "26/01/2024"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_cli_check_command_parsing() {
        let args = ["quire", "check", "--strict"];
        let cli = Cli::parse_from(args);

        match cli.command {
            Commands::Check { strict } => {
                assert!(strict);
            }
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_cli_verbosity_flags() {
        let args = ["quire", "-vvv", "build"];
        let cli = Cli::parse_from(args);
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn test_cli_custom_config_path() {
        let args = ["quire", "--config", "site/quire.toml", "check"];
        let cli = Cli::parse_from(args);
        assert_eq!(cli.config, PathBuf::from("site/quire.toml"));
    }
}
