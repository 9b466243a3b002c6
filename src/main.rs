// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod board;
mod config;
mod widget_manager;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use log::{error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use whazzup_feed::RegionTable;

use config::AppConfig;
use widget_manager::{Widget, WidgetManager};

/// Which widgets to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum WidgetArg {
    All,
    Traffic,
    Controllers,
    Sectors,
    Weather,
}

impl WidgetArg {
    fn widgets(self) -> Vec<Widget> {
        match self {
            Self::All => Widget::ALL.to_vec(),
            Self::Traffic => vec![Widget::Traffic],
            Self::Controllers => vec![Widget::Controllers],
            Self::Sectors => vec![Widget::Sectors],
            Self::Weather => vec![Widget::Weather],
        }
    }
}

/// Live IVAO traffic, controllers and METARs for the Amman, Damascus and Baghdad FIRs
#[derive(Debug, Parser)]
#[command(name = "firboard", version, about)]
struct Cli {
    /// Load configuration from this file instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Widget to run
    #[arg(short, long, value_enum, default_value_t = WidgetArg::All)]
    widget: WidgetArg,

    /// Run one cycle per widget, print the board and exit
    #[arg(long)]
    once: bool,

    /// Print the configuration file path and exit
    #[arg(long)]
    print_config_path: bool,
}

/// Operator commands read from stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Refresh,
    Dismiss,
    Quit,
}

impl Input {
    fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "r" | "refresh" => Some(Self::Refresh),
            "d" | "dismiss" => Some(Self::Dismiss),
            "q" | "quit" => Some(Self::Quit),
            _ => None,
        }
    }
}

async fn run_interactive(manager: &WidgetManager) -> Result<(), Box<dyn Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    info!("Commands: r = refresh, d = dismiss errors, q = quit");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            line = lines.next_line() => match line? {
                Some(line) => match Input::parse(&line) {
                    Some(Input::Refresh) => manager.refresh_all(),
                    Some(Input::Dismiss) => manager.dismiss_all(),
                    Some(Input::Quit) => break,
                    None if line.trim().is_empty() => {}
                    None => warn!("Unknown command {:?}", line.trim()),
                },
                // stdin closed; keep polling until interrupted
                None => {
                    tokio::signal::ctrl_c().await?;
                    break;
                }
            },
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if cli.print_config_path {
        println!("{}", AppConfig::get_config_path()?.display());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    }
    .inspect_err(|e| error!("Failed to load configuration: {e}"))?;

    let regions = RegionTable::load_or_builtin(config.regions_path.as_deref())
        .inspect_err(|e| error!("Failed to load region table: {e}"))?;
    let regions = Arc::new(regions);

    let mut manager = WidgetManager::start(&config, &regions, &cli.widget.widgets())?;

    if cli.once {
        manager.wait_first_cycle().await;
        println!("{}", manager.render_all());
    } else {
        manager.start_watchers();
        run_interactive(&manager).await?;
    }

    manager.stop_all();
    info!("Goodbye");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_commands() {
        assert_eq!(Input::parse("r"), Some(Input::Refresh));
        assert_eq!(Input::parse(" D \n"), Some(Input::Dismiss));
        assert_eq!(Input::parse("quit"), Some(Input::Quit));
        assert_eq!(Input::parse("x"), None);
    }

    #[test]
    fn test_cli_defaults_to_all_widgets() {
        let cli = Cli::try_parse_from(["firboard"]).unwrap();
        assert_eq!(cli.widget, WidgetArg::All);
        assert_eq!(cli.widget.widgets(), Widget::ALL.to_vec());
        assert!(!cli.once);
    }

    #[test]
    fn test_cli_single_widget() {
        let cli = Cli::try_parse_from(["firboard", "--widget", "weather", "--once"]).unwrap();
        assert_eq!(cli.widget.widgets(), vec![Widget::Weather]);
        assert!(cli.once);
        assert!(Cli::try_parse_from(["firboard", "--widget", "radar"]).is_err());
    }
}
