#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that replays room inputs against a level.
//!
//! The script is a JSON-lines stream of room inputs. Every input is applied
//! in order and the resulting batch is printed to standard output as one
//! JSON line. Logs go to standard error.

use std::{
    fs,
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::PathBuf,
    time::Duration,
};

use anyhow::{Context, Result};
use capyvent_core::VentGoal;
use capyvent_room::{Room, RoomConfig, RoomError, RoomInput};
use clap::Parser;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Replays a script of room inputs against a capybara vent puzzle level.
#[derive(Debug, Parser)]
#[command(name = "capyvent", version)]
struct Args {
    /// Path to the JSON level document.
    level: PathBuf,
    /// JSON-lines script of room inputs. Standard input is read when absent.
    #[arg(long)]
    script: Option<PathBuf>,
    /// Maximum number of players admitted at once.
    #[arg(long, default_value_t = RoomConfig::new().max_players())]
    max_players: usize,
    /// Visibility window of single-shot fixture beams in milliseconds.
    #[arg(long, default_value_t = 500)]
    laser_visibility_ms: u64,
    /// Time between capybara steps in milliseconds. Zero keeps it still.
    #[arg(long, default_value_t = 400)]
    capybara_step_ms: u64,
    /// Let the capybara head for closed vents too.
    #[arg(long)]
    any_vent: bool,
    /// Print the final map snapshot once the script is exhausted.
    #[arg(long)]
    final_snapshot: bool,
}

impl Args {
    fn room_config(&self) -> RoomConfig {
        let goal = if self.any_vent {
            VentGoal::AnyVent
        } else {
            VentGoal::OpenOnly
        };
        RoomConfig::new()
            .with_tick_interval(Duration::ZERO)
            .with_max_players(self.max_players)
            .with_laser_visibility(Duration::from_millis(self.laser_visibility_ms))
            .with_capybara_step(Duration::from_millis(self.capybara_step_ms))
            .with_capybara_goal(goal)
    }
}

/// Entry point for the capyvent command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let document = fs::read_to_string(&args.level)
        .with_context(|| format!("failed to read level at {}", args.level.display()))?;
    let mut room = Room::from_document(&document, args.room_config())
        .with_context(|| format!("failed to load level at {}", args.level.display()))?;
    info!(level = %args.level.display(), "room created");

    let script: Box<dyn BufRead> = match &args.script {
        Some(path) => Box::new(BufReader::new(fs::File::open(path).with_context(|| {
            format!("failed to open script at {}", path.display())
        })?)),
        None => Box::new(io::stdin().lock()),
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    replay(&mut room, script, &mut out)?;
    if args.final_snapshot {
        serde_json::to_writer(&mut out, &json!({ "snapshot": room.snapshot() }))
            .context("failed to write final snapshot")?;
        writeln!(out)?;
    }
    out.flush().context("failed to flush output")?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

/// Applies every input of `script` to `room`, writing one JSON line per
/// input. Blank lines and lines starting with `#` are skipped.
fn replay(room: &mut Room, script: impl BufRead, out: &mut impl Write) -> Result<()> {
    for (number, line) in script.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read script line {}", number + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let input: RoomInput = serde_json::from_str(trimmed)
            .with_context(|| format!("script line {} is not a room input", number + 1))?;

        match room.process(input) {
            Ok(batch) => serde_json::to_writer(&mut *out, &batch)?,
            Err(RoomError::Closed) => {
                warn!(line = number + 1, "input after disposal ignored");
                break;
            }
            Err(error) => {
                serde_json::to_writer(&mut *out, &json!({ "error": error.to_string() }))?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    const CORRIDOR: &str = r#"{
        "width": 3,
        "height": 1,
        "layout": [0, 0, 0],
        "entities": { "players": [{ "x": 0, "y": 0 }] }
    }"#;

    fn run(script: &str, config: RoomConfig) -> Vec<Value> {
        let mut room = Room::from_document(CORRIDOR, config).expect("valid level");
        let mut out = Vec::new();
        replay(&mut room, script.as_bytes(), &mut out).expect("replay");
        String::from_utf8(out)
            .expect("utf-8 output")
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect()
    }

    #[test]
    fn prints_one_line_per_input() {
        let script = r#"
# join then walk
{"input":"join","session":"s1","name":"ada"}
{"input":"client","session":"s1","request":{"type":"move","dx":1,"dy":0}}
{"input":"tick","ms":100}
"#;

        let lines = run(script, RoomConfig::new());

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["events"][0]["PlayerJoined"]["name"], "ADA");
        assert_eq!(lines[1]["events"][0]["PlayerMoved"]["to"]["x"], 1);
        assert!(lines[2]["events"][0].get("TimeAdvanced").is_some());
    }

    #[test]
    fn room_errors_are_reported_inline() {
        let script = r#"{"input":"join","session":"s1"}
{"input":"join","session":"s2"}
{"input":"dispose"}
{"input":"tick","ms":100}"#;

        let lines = run(script, RoomConfig::new().with_max_players(1));

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1]["error"], "room is full (1 players)");
        assert_eq!(lines[2]["events"][0], "RoomDisposed");
    }

    #[test]
    fn malformed_lines_abort_the_replay() {
        let mut room = Room::from_document(CORRIDOR, RoomConfig::new()).expect("valid level");
        let error = replay(&mut room, "{\"input\":\"warp\"}".as_bytes(), &mut Vec::<u8>::new())
            .expect_err("unknown input");
        assert!(error.to_string().contains("line 1"));
    }

    #[test]
    fn flags_shape_the_room_config() {
        let args = Args::parse_from([
            "capyvent",
            "level.json",
            "--max-players",
            "2",
            "--capybara-step-ms",
            "0",
            "--any-vent",
        ]);
        let config = args.room_config();

        assert_eq!(config.max_players(), 2);
        assert!(config.capybara_step().is_zero());
        assert_eq!(config.capybara_goal(), VentGoal::AnyVent);
        assert!(config.tick_interval().is_zero());
    }
}
