//! Stereo photogrammetry command line tool
//!
//! Estimates object position and depth from pixel coordinates seen by the two
//! cameras of a stereo rig. Output coordinates are in the center camera's
//! Default CS; depth is in the baseline's length unit.
//!
//! Usage:
//! ```bash
//! # Enter one row interactively
//! photogrammetry
//! Enter coordinates with spaces (xl yl xr yr): 1045 0 648 0
//!
//! # One output line per input line
//! photogrammetry samples/coordinates.txt --config samples/stereo_rig.yaml
//! ```

use clap::Parser;
use log::{error, info};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use stereo_photogrammetry::util;
use stereo_photogrammetry::{DoubleCameraModel, StereoConfig};

/// Stereo rig object position estimation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// File with one `xl yl xr yr` row per line. Reads one row from stdin if omitted.
    input: Option<PathBuf>,

    /// Path to the rig configuration YAML file. Uses the built-in reference rig if omitted.
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Append the depth error estimate to every result
    #[arg(short = 'e', long)]
    with_error: bool,

    /// Also write successful results to this CSV file
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
}

fn load_rig(config: Option<&PathBuf>) -> Result<DoubleCameraModel, Box<dyn std::error::Error>> {
    let config = match config {
        Some(path) => {
            let path_str = path.to_str().ok_or("Invalid config path string")?;
            StereoConfig::load_from_yaml(path_str)?
        }
        None => {
            info!("No configuration given, using the reference rig");
            StereoConfig::default()
        }
    };
    Ok(DoubleCameraModel::from_config(&config)?)
}

fn read_interactive_row() -> io::Result<String> {
    print!("Enter coordinates with spaces (xl yl xr yr): ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let cli = Cli::parse();
    let rig = load_rig(cli.config.as_ref())?;

    let results = match &cli.input {
        Some(path) => match util::process_file(&rig, path, cli.with_error) {
            Ok(results) => results,
            Err(e) => {
                error!("Failed to read {}: {}", path.display(), e);
                println!("{e}");
                return Ok(());
            }
        },
        None => {
            let row = read_interactive_row()?;
            vec![util::process_single_row(&rig, &row, cli.with_error)]
        }
    };

    for result in &results {
        println!("{}", util::format_row(result));
    }

    if let Some(output) = &cli.output {
        let written = util::export_results_csv(&results, output)?;
        info!("Wrote {} results to {}", written, output.display());
    }

    Ok(())
}
