//! Command line interface

pub mod objectives;
pub mod ports;
pub mod run;

use clap::{Args, Parser, Subcommand};
use stagekit_core::ScanForm;
use stagekit_settings::Config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "stagekit")]
#[command(version, about = "Raster-scan acquisition on ASI-style motorized microscope stages.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List serial ports on this machine
    #[command(alias = "p")]
    Ports,
    /// Show the contents of an objective table file
    #[command(alias = "o")]
    Objectives { file: PathBuf },
    /// Connect and run one acquisition
    #[command(alias = "r")]
    Run(RunArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Configuration file (.toml or .json)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Serial port, overrides the config
    #[arg(long)]
    pub port: Option<String>,
    /// Baud rate, overrides the config
    #[arg(long)]
    pub baud: Option<u32>,
    /// Objective table file, overrides the config
    #[arg(long)]
    pub objectives: Option<PathBuf>,
    /// Index of the objective in the table
    #[arg(long)]
    pub objective: usize,
    /// Exposure time in seconds
    #[arg(long)]
    pub exposure: String,
    /// Grid points along X
    #[arg(long)]
    pub nx: u32,
    /// Grid points along Y
    #[arg(long)]
    pub ny: u32,
    /// Step size along X
    #[arg(long)]
    pub rx: String,
    /// Step size along Y
    #[arg(long)]
    pub ry: String,
    /// Talk to an in-process simulated controller instead of a port
    #[arg(long)]
    pub simulate: bool,
    /// Print the command sequence without connecting
    #[arg(long)]
    pub dry_run: bool,
    /// Delay between status queries, overrides the config
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,
    /// Busy-wait limit per step, overrides the config
    #[arg(long)]
    pub max_wait_ms: Option<u64>,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl RunArgs {
    /// Apply command line overrides on top of `config`
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(port) = &self.port {
            config.connection.port = port.clone();
        }
        if let Some(baud) = self.baud {
            config.connection.baud_rate = baud;
        }
        if let Some(path) = &self.objectives {
            config.objectives_file = Some(path.clone());
        }
        if let Some(interval) = self.poll_interval_ms {
            config.polling.poll_interval_ms = interval;
        }
        if self.max_wait_ms.is_some() {
            config.polling.max_wait_ms = self.max_wait_ms;
        }
        config
    }

    /// Scan parameters as entered
    pub fn scan_form(&self) -> ScanForm {
        ScanForm {
            exposure: self.exposure.clone(),
            nx: self.nx,
            ny: self.ny,
            rx: self.rx.clone(),
            ry: self.ry.clone(),
            objective: Some(self.objective),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec![
            "stagekit", "run", "--objective", "1", "--exposure", "0.5", "--nx", "3", "--ny", "2",
            "--rx", "0.1", "--ry", "0.2",
        ];
        argv.extend_from_slice(extra);
        match CommandLine::try_parse_from(argv).unwrap().command {
            Commands::Run(args) => args,
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_run() {
        let args = run_args(&["--simulate"]);
        assert!(args.simulate);
        assert!(!args.dry_run);
        assert_eq!(
            args.scan_form(),
            ScanForm {
                exposure: "0.5".to_string(),
                nx: 3,
                ny: 2,
                rx: "0.1".to_string(),
                ry: "0.2".to_string(),
                objective: Some(1),
            }
        );
    }

    #[test]
    fn test_overrides_apply_over_config() {
        let args = run_args(&["--port", "COM4", "--baud", "9600", "--max-wait-ms", "5000"]);
        let config = args.apply(Config::default());
        assert_eq!(config.connection.port, "COM4");
        assert_eq!(config.connection.baud_rate, 9600);
        assert_eq!(config.polling.max_wait_ms, Some(5000));
        assert_eq!(config.polling.poll_interval_ms, 0);
    }

    #[test]
    fn test_subcommand_aliases() {
        assert!(matches!(
            CommandLine::try_parse_from(["stagekit", "p"]).unwrap().command,
            Commands::Ports
        ));
        assert!(matches!(
            CommandLine::try_parse_from(["stagekit", "o", "table.json"]).unwrap().command,
            Commands::Objectives { .. }
        ));
    }

    #[test]
    fn test_run_requires_scan_parameters() {
        assert!(CommandLine::try_parse_from(["stagekit", "run", "--objective", "0"]).is_err());
    }
}
