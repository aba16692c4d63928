//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Wheelmirror - caching mirror for Python package indexes
///
/// Serves a PEP 503 simple index that routes every download through a local
/// artifact cache.
#[derive(Parser, Debug)]
#[command(name = "wheelmirror")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "WHEELMIRROR_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the mirror HTTP server
    Serve(ServeArgs),

    /// Show or edit configuration
    Config(ConfigArgs),

    /// Inspect the artifact cache
    Cache(CacheArgs),
}

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind (overrides server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides server.port)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Origin simple index URL (overrides origin.index_url)
    #[arg(long)]
    pub origin: Option<String>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cached artifacts
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

/// Output format for list commands
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Plain,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn help_summary_comes_from_doc_comment() {
        let cmd = Cli::command();
        assert_eq!(
            cmd.get_about().map(|about| about.to_string()).as_deref(),
            Some("Wheelmirror - caching mirror for Python package indexes")
        );
        assert!(cmd.get_long_about().is_none());
    }

    #[test]
    fn cli_parses_serve_defaults() {
        let cli = Cli::parse_from(["wheelmirror", "serve"]);
        match cli.command {
            Commands::Serve(args) => {
                assert!(args.host.is_none());
                assert!(args.port.is_none());
                assert!(args.origin.is_none());
            }
            _ => panic!("expected Serve command"),
        }
    }

    #[test]
    fn cli_parses_serve_overrides() {
        let cli = Cli::parse_from([
            "wheelmirror",
            "serve",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
            "--origin",
            "https://test.pypi.org/simple",
        ]);
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
                assert_eq!(args.port, Some(8080));
                assert_eq!(args.origin.as_deref(), Some("https://test.pypi.org/simple"));
            }
            _ => panic!("expected Serve command"),
        }
    }

    #[test]
    fn cli_parses_config_init_force() {
        let cli = Cli::parse_from(["wheelmirror", "config", "init", "--force"]);
        match cli.command {
            Commands::Config(ConfigArgs {
                action: Some(ConfigAction::Init { force }),
            }) => assert!(force),
            _ => panic!("expected config init"),
        }
    }

    #[test]
    fn cli_parses_cache_list_format() {
        let cli = Cli::parse_from(["wheelmirror", "cache", "list", "--format", "json"]);
        match cli.command {
            Commands::Cache(CacheArgs {
                action: CacheAction::List { format },
            }) => assert!(matches!(format, OutputFormat::Json)),
            _ => panic!("expected cache list"),
        }
    }

    #[test]
    fn cli_verbose_levels() {
        let cli = Cli::parse_from(["wheelmirror", "serve"]);
        assert_eq!(cli.verbose, 0);

        let cli = Cli::parse_from(["wheelmirror", "-v", "serve"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["wheelmirror", "-vv", "serve"]);
        assert_eq!(cli.verbose, 2);
    }
}
