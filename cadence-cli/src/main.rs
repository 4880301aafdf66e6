//! Lightweight CLI client for cadence-server over TCP

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "cad")]
#[command(about = "Running cadence playlist CLI")]
#[command(version)]
struct Cli {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7878", env = "CADENCE_SERVER")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a playlist for a pace
    Recommend {
        /// Pace as M:SS
        pace: String,

        #[arg(short, long, default_value = "km")]
        unit: String,

        /// Steps per minute (defaults to the pace suggestion)
        #[arg(short, long)]
        cadence: Option<u32>,

        /// Comma-separated genres
        #[arg(short, long, value_delimiter = ',')]
        genres: Vec<String>,
    },

    /// Show section BPM targets for a cadence
    Targets { cadence: u32 },

    /// Suggest a cadence for a pace
    Suggest {
        pace: String,

        #[arg(short, long, default_value = "km")]
        unit: String,
    },

    Status,
    Cache {
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Serialize, Default)]
struct Request {
    method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cadence: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    genres: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct Response {
    success: bool,
    message: Option<String>,
    data: Option<serde_json::Value>,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let request = match cli.command {
        Commands::Recommend { pace, unit, cadence, genres } => Request {
            method: "recommend".into(),
            pace: Some(pace),
            unit: Some(unit.to_lowercase()),
            cadence,
            genres: if genres.is_empty() { None } else { Some(genres) },
        },
        Commands::Targets { cadence } => Request {
            method: "targets".into(),
            cadence: Some(cadence),
            ..Default::default()
        },
        Commands::Suggest { pace, unit } => Request {
            method: "suggest".into(),
            pace: Some(pace),
            unit: Some(unit.to_lowercase()),
            ..Default::default()
        },
        Commands::Status => Request {
            method: "status".into(),
            ..Default::default()
        },
        Commands::Cache { clear } => Request {
            method: if clear { "cache_clear" } else { "cache_stats" }.into(),
            ..Default::default()
        },
    };

    let mut stream = TcpStream::connect(&cli.server)
        .map_err(|e| format!("Cannot connect to server at {}: {}", cli.server, e))?;

    let request_json = serde_json::to_string(&request)?;
    writeln!(stream, "{}", request_json)?;
    stream.flush()?;

    let mut reader = BufReader::new(&stream);
    let mut response_line = String::new();
    reader.read_line(&mut response_line)?;

    let response: Response = serde_json::from_str(&response_line)?;

    if response.success {
        if let Some(msg) = response.message {
            println!("✓ {}", msg);
        }

        if let Some(data) = response.data {
            print_data(&data, &request.method);
        }
    } else {
        if let Some(msg) = response.message {
            eprintln!("✗ {}", msg);
        }
        std::process::exit(1);
    }

    Ok(())
}

fn section_title(section_type: &str) -> &'static str {
    match section_type {
        "warmup" => "Warm-Up",
        "main" => "Main Workout",
        "cooldown" => "Cool-Down",
        _ => "Section",
    }
}

fn mapping_label(mapping: &str) -> &'static str {
    match mapping {
        "half" => "0.5×",
        "double" => "2×",
        _ => "1×",
    }
}

fn print_data(data: &serde_json::Value, method: &str) {
    match method {
        "recommend" => {
            let sections = data
                .get("playlist")
                .and_then(|p| p.get("sections"))
                .and_then(|s| s.as_array());
            let Some(sections) = sections else { return };

            for section in sections {
                let kind = section.get("type").and_then(|v| v.as_str()).unwrap_or("?");
                let target = section.get("targetBpm").and_then(|v| v.as_u64()).unwrap_or(0);
                println!("\n{} ({} BPM)", section_title(kind), target);

                let tracks = section.get("tracks").and_then(|t| t.as_array());
                match tracks {
                    Some(tracks) if !tracks.is_empty() => {
                        for (i, track) in tracks.iter().enumerate() {
                            let name = track.get("name").and_then(|v| v.as_str()).unwrap_or("?");
                            let artist = track.get("artist").and_then(|v| v.as_str()).unwrap_or("?");
                            let bpm = track.get("mappedBpm").and_then(|v| v.as_f64()).unwrap_or(0.0);
                            let mapping = track.get("mapping").and_then(|v| v.as_str()).unwrap_or("normal");

                            println!("  {:2}. {} - {} [{:.0} BPM, {}]", i + 1, artist, name, bpm, mapping_label(mapping));
                        }
                    }
                    _ => println!("  (no matching tracks)"),
                }
            }
        }
        "targets" => {
            if let Some(targets) = data.get("targets") {
                for (key, title) in [("warmup", "Warm-Up"), ("main", "Main Workout"), ("cooldown", "Cool-Down")] {
                    let bpm = targets.get(key).and_then(|v| v.as_u64()).unwrap_or(0);
                    println!("  {:<13} {} BPM", title, bpm);
                }
            }
        }
        "cache_stats" => {
            let entries = data.get("entries").and_then(|v| v.as_u64()).unwrap_or(0);
            let size_mb = data.get("size_mb").and_then(|v| v.as_f64()).unwrap_or(0.0);
            println!("  Entries: {}", entries);
            println!("  Size: {:.2} MB", size_mb);
        }
        _ => {
            // Pretty print JSON for everything else
            println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_skips_empty_fields() {
        let req = Request {
            method: "targets".into(),
            cadence: Some(175),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&req).unwrap(),
            r#"{"method":"targets","cadence":175}"#
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(section_title("warmup"), "Warm-Up");
        assert_eq!(section_title("main"), "Main Workout");
        assert_eq!(mapping_label("half"), "0.5×");
        assert_eq!(mapping_label("normal"), "1×");
        assert_eq!(mapping_label("double"), "2×");
    }
}
