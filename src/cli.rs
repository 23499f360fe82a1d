use clap::{Parser, Subcommand};

/// Approval Relay — forwards approval decisions to a workflow engine
#[derive(Parser)]
#[command(name = "approval-relay", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the relay server
    Serve {
        /// Port to bind (overrides RELAY_PORT / PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Publish a probe message through the configured transport
    Check {
        /// Correlation key to send the probe with
        #[arg(long, env = "RELAY_CHECK_CORRELATION_KEY")]
        correlation_key: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_port_override() {
        let cli = Cli::try_parse_from(["approval-relay", "serve", "--port", "9000"]).unwrap();
        match cli.command {
            Some(Commands::Serve { port }) => assert_eq!(port, Some(9000)),
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_no_subcommand_defaults_to_none() {
        let cli = Cli::try_parse_from(["approval-relay"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_check_takes_correlation_key() {
        let cli =
            Cli::try_parse_from(["approval-relay", "check", "--correlation-key", "k-1"]).unwrap();
        match cli.command {
            Some(Commands::Check { correlation_key }) => assert_eq!(correlation_key, "k-1"),
            _ => panic!("expected check"),
        }
    }
}
