//! Command-line interface
//!
//! Reads a G-code file, runs the robot extruder transform over it and writes
//! the result. Output is only written once the whole document has been
//! processed successfully.

use anyhow::Context;
use clap::Parser;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use robopost_gcode::{join_layers, split_layers, SequenceDriver};
use robopost_settings::{default_config_path, plugin_schema, RobotSettings};

/// Insert robot extruder pin commands into sliced G-code
#[derive(Debug, Parser)]
#[command(
    name = "robopost",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_DATE"), ")"),
    about
)]
pub struct Cli {
    /// G-code file to process
    #[arg(required_unless_present = "print_schema")]
    pub input: Option<PathBuf>,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Settings file (.toml or .json); defaults to the user config file if present
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// On/off pin number
    #[arg(long, allow_negative_numbers = true)]
    pub acv_pin: Option<i64>,

    /// Direction pin number
    #[arg(long, allow_negative_numbers = true)]
    pub dir_pin: Option<i64>,

    /// Speed mode pin number
    #[arg(long, allow_negative_numbers = true)]
    pub spd_pin: Option<i64>,

    /// Add dwells for extrusion without movement
    #[arg(long, overrides_with = "no_dwell")]
    pub dwell: bool,

    /// Do not add dwells, even if the settings file enables them
    #[arg(long, overrides_with = "dwell")]
    pub no_dwell: bool,

    /// Stationary extruder feed rate in mm/s
    #[arg(long, allow_negative_numbers = true)]
    pub set_speed: Option<f64>,

    /// Append a state comment after every motion line
    #[arg(long, overrides_with = "no_debug_comments")]
    pub debug_comments: bool,

    /// Do not append state comments, even if the settings file enables them
    #[arg(long, overrides_with = "debug_comments")]
    pub no_debug_comments: bool,

    /// Print the post-processing plugin settings schema and exit
    #[arg(long)]
    pub print_schema: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,
}

impl Cli {
    /// Settings from the config file with command-line overrides applied
    pub fn settings(&self) -> anyhow::Result<RobotSettings> {
        let mut settings = match &self.config {
            Some(path) => RobotSettings::load_from_file(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?,
            None => match default_config_path().filter(|path| path.is_file()) {
                Some(path) => {
                    tracing::info!("Using settings from {}", path.display());
                    RobotSettings::load_from_file(&path)?
                }
                None => RobotSettings::default(),
            },
        };

        if let Some(pin) = self.acv_pin {
            settings.acv_pin = Some(pin);
        }
        if let Some(pin) = self.dir_pin {
            settings.dir_pin = Some(pin);
        }
        if let Some(pin) = self.spd_pin {
            settings.spd_pin = Some(pin);
        }
        if self.dwell {
            settings.dwell = true;
        } else if self.no_dwell {
            settings.dwell = false;
        }
        if let Some(set_speed) = self.set_speed {
            settings.set_speed = set_speed;
        }
        if self.debug_comments {
            settings.debug = true;
        } else if self.no_debug_comments {
            settings.debug = false;
        }

        Ok(settings)
    }
}

/// Execute the command line
pub fn run(cli: &Cli) -> anyhow::Result<()> {
    if cli.print_schema {
        println!("{}", plugin_schema().to_json()?);
        return Ok(());
    }

    let input = cli.input.as_ref().context("No input file given")?;
    let config = cli.settings()?.resolve();

    let text = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let blocks = split_layers(&text);

    let mut driver = SequenceDriver::new(config);
    let output = driver
        .run(blocks)
        .with_context(|| format!("Failed to process {}", input.display()))?;
    let result = join_layers(&output);

    match &cli.output {
        Some(path) => fs::write(path, &result)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => std::io::stdout()
            .lock()
            .write_all(result.as_bytes())
            .context("Failed to write to stdout")?,
    }

    let stats = driver.stats();
    tracing::info!(
        "{}: {} lines, {} pin commands, {} dwells",
        input.display(),
        stats.lines,
        stats.pin_commands,
        stats.dwells
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply_on_top_of_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("robot.toml");
        std::fs::write(&path, "acv_pin = 4\ndir_pin = 5\nspd_pin = 6\nset_speed = 9.0\n").unwrap();

        let cli = Cli::parse_from([
            "robopost",
            "in.gcode",
            "--config",
            path.to_str().unwrap(),
            "--spd-pin",
            "8",
            "--dwell",
        ]);
        let settings = cli.settings().unwrap();
        assert_eq!(settings.acv_pin, Some(4));
        assert_eq!(settings.spd_pin, Some(8));
        assert_eq!(settings.set_speed, 9.0);
        assert!(settings.dwell);
        assert!(!settings.debug);
    }

    #[test]
    fn test_negated_flags_switch_off_file_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("robot.toml");
        std::fs::write(&path, "dwell = true\ndebug = true\n").unwrap();

        let cli = Cli::parse_from([
            "robopost",
            "in.gcode",
            "--config",
            path.to_str().unwrap(),
            "--no-dwell",
            "--no-debug-comments",
        ]);
        let settings = cli.settings().unwrap();
        assert!(!settings.dwell);
        assert!(!settings.debug);

        let cli = Cli::parse_from([
            "robopost",
            "in.gcode",
            "--config",
            path.to_str().unwrap(),
            "--no-dwell",
            "--dwell",
        ]);
        assert!(cli.settings().unwrap().dwell);
    }

    #[test]
    fn test_schema_flag_needs_no_input() {
        let cli = Cli::parse_from(["robopost", "--print-schema"]);
        assert!(cli.input.is_none());
        assert!(cli.print_schema);
    }

    #[test]
    fn test_input_required_otherwise() {
        assert!(Cli::try_parse_from(["robopost", "--dwell"]).is_err());
    }

    const SLICED: &str = ";FLAVOR:Marlin\n\
    ;LAYER_COUNT:2\n\
    ;LAYER:0\n\
    G0 X10 Y10 Z0.3\n\
    G1 X20 Y10 E0.5\n\
    G1 E-1.5\n\
    ;LAYER:1\n\
    G0 X10 Y20 Z0.6\n\
    G1 E1.5\n\
    G1 X20 Y20 E0.9\n\
    M107\n";

    #[test]
    fn test_process_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("part.gcode");
        let output = dir.path().join("part_robot.gcode");
        std::fs::write(&input, SLICED).unwrap();

        let cli = Cli::parse_from([
            "robopost",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--dwell",
            "--set-speed",
            "30",
        ]);
        run(&cli).unwrap();

        let result = std::fs::read_to_string(&output).unwrap();
        assert!(result.starts_with(";Using Print with Robot post processing script:\n"));
        assert!(result.contains(";  Stationary Feed Rate: 30.0\n"));
        assert!(result.contains("G4 P0.05000 ;Robot Dwell\nM63 P1 ;Robot Extruder direction: Backward\n"));
        assert!(result.contains(";LAYER:1\nM63 P0 ;Robot Extruder active: Off\nG0 X10 Y20 Z0.6\n"));
        assert!(result.ends_with("M107\n\nM63 P0 M63 P1 M63 P2 ;Turn all Robot pins off\n"));
    }

    #[test]
    fn test_malformed_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bad.gcode");
        let output = dir.path().join("bad_robot.gcode");
        std::fs::write(&input, ";LAYER:0\nG1 X1 E0.4\nG1 X2 Eoops\n").unwrap();

        let cli = Cli::parse_from([
            "robopost",
            input.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ]);
        let err = run(&cli).unwrap_err();

        assert!(format!("{err:#}").contains("Invalid parameter 'E' at layer 0 line 3"));
        assert!(!output.exists());
    }

    #[test]
    fn test_missing_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("absent.gcode");

        let cli = Cli::parse_from(["robopost", input.to_str().unwrap()]);
        assert!(run(&cli).is_err());
    }
}
