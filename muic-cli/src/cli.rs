//! CLI argument parsing

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "muicd")]
#[command(version, about = "Run a cable scenario through the MUIC engine", long_about = None)]
pub struct Cli {
    /// Settings file (JSON). Defaults to <config dir>/muicd/settings.json
    #[arg(short, long)]
    pub settings: Option<PathBuf>,

    /// Start the simulated chip with the bootloader's rustproof switch pattern
    #[arg(long)]
    pub rustproof: bool,

    /// Print the default settings as JSON and exit
    #[arg(long)]
    pub print_default: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from(["muicd", "--settings", "/tmp/s.json", "--rustproof"]);
        assert_eq!(cli.settings, Some(PathBuf::from("/tmp/s.json")));
        assert!(cli.rustproof);
        assert!(!cli.print_default);
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["muicd"]);
        assert!(cli.settings.is_none());
        assert!(!cli.rustproof);
    }
}
