use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "offsync")]
#[command(about = "Offline-first action queue with deferred replay")]
#[command(long_about = "offsync - an offline-first action queue

Actions are attempted immediately. When the network is down or the
handler fails, they are stored in a durable pile and replayed later
with their original timestamp.

QUICK START:
  offsync submit Ada Lovelace          Send the contact form
  offsync --offline submit Ada Lovelace   Force queuing
  offsync status                       Show what is waiting
  offsync sync                         Replay the pile

OUTPUT FORMATS:
  --output pretty    Human-readable colored output (default)
  --output json      Machine-readable JSON for scripting

For more information on a specific command, run:
  offsync <command> --help")]
#[command(version, propagate_version = true)]
pub struct Cli {
    /// Output format for command results
    ///
    /// Use 'pretty' for human-readable colored output (default),
    /// or 'json' for machine-readable output suitable for scripting.
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Treat the network as down, regardless of configuration
    #[arg(long, global = true, conflicts_with = "online")]
    pub offline: bool,

    /// Treat the network as up, regardless of configuration
    #[arg(long, global = true)]
    pub online: bool,

    /// Log debug information to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable colored output.
    #[default]
    Pretty,
    /// Machine-readable JSON output.
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit the contact form
    ///
    /// Delivers the form right away when online. When offline, or when
    /// delivery fails, the submission is queued and sent on the next sync.
    ///
    /// # Examples
    ///
    ///   offsync submit Ada Lovelace
    ///   offsync --offline submit Ada Lovelace
    #[command(alias = "s")]
    Submit {
        /// First name
        firstname: String,
        /// Last name
        lastname: String,
    },

    /// Queue an action without attempting it
    ///
    /// The action must be registered. Data is a JSON object.
    ///
    /// # Examples
    ///
    ///   offsync enqueue send_form -d '{"firstname":"Ada","lastname":"Lovelace"}'
    Enqueue {
        /// Registered action name
        action: String,

        /// Action data as a JSON object
        #[arg(short, long, default_value = "{}")]
        data: String,
    },

    /// Replay every queued action
    ///
    /// Delivered actions are removed; failed ones stay queued. Exits with
    /// an error if any replay failed.
    Sync,

    /// Show the pile and network status
    #[command(alias = "st")]
    Status,

    /// List queued actions
    #[command(alias = "ls")]
    List {
        /// Print only the action data payloads
        #[arg(long)]
        data_only: bool,
    },

    /// Remove queued actions
    ///
    /// With an action name, removes every record of that action. Records
    /// whose action is not registered are always removed.
    Purge {
        /// Action name to remove
        action: Option<String>,
    },

    /// Show forms delivered to the outbox
    Outbox,

    /// Generate shell completions
    ///
    /// Example: offsync completions bash > ~/.bash_completion.d/offsync
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,

        /// Show installation instructions
        #[arg(long, short = 'i')]
        install: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_submit_command() {
        let cli = Cli::try_parse_from(["offsync", "submit", "Ada", "Lovelace"]).unwrap();
        match cli.command {
            Commands::Submit {
                firstname,
                lastname,
            } => {
                assert_eq!(firstname, "Ada");
                assert_eq!(lastname, "Lovelace");
            }
            _ => panic!("Expected Submit command"),
        }
    }

    #[test]
    fn test_cli_submit_requires_both_names() {
        assert!(Cli::try_parse_from(["offsync", "submit", "Ada"]).is_err());
    }

    #[test]
    fn test_cli_global_flags_after_command() {
        let cli = Cli::try_parse_from(["offsync", "status", "--offline", "-o", "json"]).unwrap();
        assert!(cli.offline);
        assert!(!cli.online);
        assert_eq!(cli.output, Some(OutputFormat::Json));
        assert!(matches!(cli.command, Commands::Status));
    }

    #[test]
    fn test_cli_offline_conflicts_with_online() {
        assert!(Cli::try_parse_from(["offsync", "--offline", "--online", "sync"]).is_err());
    }

    #[test]
    fn test_cli_enqueue_default_data() {
        let cli = Cli::try_parse_from(["offsync", "enqueue", "send_form"]).unwrap();
        match cli.command {
            Commands::Enqueue { action, data } => {
                assert_eq!(action, "send_form");
                assert_eq!(data, "{}");
            }
            _ => panic!("Expected Enqueue command"),
        }
    }

    #[test]
    fn test_cli_list_data_only() {
        let cli = Cli::try_parse_from(["offsync", "ls", "--data-only"]).unwrap();
        assert!(matches!(cli.command, Commands::List { data_only: true }));
    }

    #[test]
    fn test_cli_purge_optional_action() {
        let cli = Cli::try_parse_from(["offsync", "purge"]).unwrap();
        assert!(matches!(cli.command, Commands::Purge { action: None }));

        let cli = Cli::try_parse_from(["offsync", "purge", "send_form"]).unwrap();
        assert!(matches!(cli.command, Commands::Purge { action: Some(ref a) } if a == "send_form"));
    }

    #[test]
    fn test_cli_output_defaults_to_none() {
        let cli = Cli::try_parse_from(["offsync", "sync"]).unwrap();
        assert!(cli.output.is_none());
        assert!(!cli.verbose);
    }
}
