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

mod config;
mod report;
mod snapshot;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use config::AppConfig;
use log::{info, warn};
use overlay_core::{HeadlessMap, LatLng, LatLngBounds, OverlayController, WeatherIndicator};
use snapshot::MapSnapshot;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay weather and S2 cell map data through the overlay engine", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Treat the display as a touch/handheld device
    #[arg(long, global = true)]
    handheld: bool,

    /// Draw S2 cell outlines even if disabled in the config
    #[arg(long, global = true)]
    show_s2_cells: bool,

    /// Do not draw weather icons
    #[arg(long, global = true)]
    hide_weather_cells: bool,

    /// Do not draw weather alerts
    #[arg(long, global = true)]
    hide_weather_alerts: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply snapshots in order and report the dominant cell
    Apply {
        /// Map data JSON files
        #[arg(required = true)]
        snapshots: Vec<PathBuf>,

        /// Visible region as NE_LAT,NE_LNG,SW_LAT,SW_LNG
        #[arg(long, value_parser = parse_viewport, allow_hyphen_values = true)]
        viewport: Option<LatLngBounds>,

        /// Map zoom level (defaults to the configured zoom)
        #[arg(long)]
        zoom: Option<f64>,
    },

    /// Apply snapshots and print the drawn weather cells
    Status {
        /// Map data JSON files
        #[arg(required = true)]
        snapshots: Vec<PathBuf>,

        /// Page of the table to print (1-based)
        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Show the configuration file, optionally saving the command-line overrides
    Config {
        /// Persist the effective settings
        #[arg(long)]
        save: bool,
    },
}

fn parse_viewport(value: &str) -> Result<LatLngBounds, String> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<f64>().map_err(|e| format!("'{part}': {e}")))
        .collect::<Result<Vec<_>, _>>()?;

    match parts.as_slice() {
        [ne_lat, ne_lng, sw_lat, sw_lng] => Ok(LatLngBounds::new(
            LatLng::new(*ne_lat, *ne_lng),
            LatLng::new(*sw_lat, *sw_lng),
        )),
        _ => Err(format!("expected 4 comma-separated numbers, got {}", parts.len())),
    }
}

/// Configuration with command-line overrides applied.
fn effective_config(args: &Args) -> AppConfig {
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });

    if args.handheld {
        config.handheld = true;
    }
    if args.show_s2_cells {
        config.show_s2_cells = true;
    }
    if args.hide_weather_cells {
        config.show_weather_cells = false;
    }
    if args.hide_weather_alerts {
        config.show_weather_alerts = false;
    }
    config
}

/// Build a controller and replay every snapshot against `map`.
fn replay(
    config: &AppConfig,
    map: &mut HeadlessMap,
    paths: &[PathBuf],
) -> Result<OverlayController, Box<dyn std::error::Error>> {
    let mut overlays = OverlayController::new(config.overlay_config());

    for path in paths {
        info!("Applying {}", path.display());
        let snapshot = MapSnapshot::load(path)?;
        snapshot::apply(&mut overlays, map, snapshot)?;
    }

    Ok(overlays)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = effective_config(&args);

    match &args.command {
        Command::Apply {
            snapshots,
            viewport,
            zoom,
        } => {
            let zoom = zoom.unwrap_or(config.default_zoom);
            let fallback = LatLngBounds::new(LatLng::new(0.0, 0.0), LatLng::new(0.0, 0.0));
            let mut map = HeadlessMap::new(viewport.unwrap_or(fallback), zoom);

            let overlays = replay(&config, &mut map, snapshots)?;
            println!("{}", report::summary(&overlays));
            println!("visuals attached: {}", map.attached_count());

            if viewport.is_some() {
                let mut indicator = WeatherIndicator::new(config.indicator_height_px);
                let shown = overlays.refresh_indicator(&map, config.handheld, &mut indicator)?;
                println!("{}", report::indicator_line(shown.as_ref(), &indicator));
            }
        }
        Command::Status { snapshots, page } => {
            let mut map = HeadlessMap::new(
                LatLngBounds::new(LatLng::new(0.0, 0.0), LatLng::new(0.0, 0.0)),
                config.default_zoom,
            );
            let overlays = replay(&config, &mut map, snapshots)?;
            print!("{}", report::weather_table(&overlays, *page));
        }
        Command::Config { save } => {
            println!("{}", AppConfig::get_config_path()?.display());
            println!("{:#?}", config);
            if *save {
                config.save()?;
                info!("Configuration saved");
            }
        }
    }

    Ok(())
}
