//! Example: Analyze a single WAV file
//!
//! Usage:
//!   cargo run --release --example analyze_file -- [--json] [--config config.json] <file.wav>
//!
//! Prints the beatgrid and the structure map. With `--json`, prints both results
//! as one JSON object.

use cuepoint_dsp::{analyze_beatgrid, analyze_structure, AnalysisConfig, SampleBuffer};
use std::env;

/// Load a WAV file as a multi-channel sample buffer
fn load_wav(path: &str) -> Result<SampleBuffer, Box<dyn std::error::Error>> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_value))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok(SampleBuffer::from_interleaved(&samples, spec.channels as usize, spec.sample_rate)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut json = false;
    let mut config = AnalysisConfig::default();
    let mut path: Option<String> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => json = true,
            "--config" => {
                let config_path = args.next().ok_or("--config requires a path")?;
                config = AnalysisConfig::from_json_file(config_path)?;
            }
            "--help" | "-h" => {
                eprintln!("Usage: analyze_file [--json] [--config config.json] <file.wav>");
                return Ok(());
            }
            _ => path = Some(arg),
        }
    }

    let Some(path) = path else {
        eprintln!("ERROR: Provide a WAV file path. Use --help for usage.");
        std::process::exit(2);
    };

    let buffer = load_wav(&path)?;
    log::info!(
        "Loaded {}: {:.2} s, {} channel(s) at {} Hz",
        path,
        buffer.duration(),
        buffer.channel_count(),
        buffer.sample_rate()
    );

    let beatgrid = analyze_beatgrid(&buffer, &config);
    let structure = analyze_structure(&buffer, &config)?;

    if json {
        let output = serde_json::json!({
            "file": path,
            "beatgrid": match &beatgrid {
                Ok(grid) => serde_json::to_value(grid)?,
                Err(e) => serde_json::json!({ "error": e.to_string() }),
            },
            "structure": structure,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Analysis Results: {}", path);
    match &beatgrid {
        Ok(grid) => {
            println!(
                "  BPM: {:.2} (confidence: {:.2}, {})",
                grid.bpm, grid.confidence, grid.algorithm
            );
            println!("  Beats: {} ({} downbeats)", grid.beats.len(), grid.downbeats.len());
            if let Some(first) = grid.first_beat() {
                println!("  First beat: {:.3} s", first);
            }
        }
        Err(e) => println!("  Beatgrid unavailable: {}", e),
    }
    println!(
        "  Structure: {} sections (confidence: {:.2}, {})",
        structure.sections.len(),
        structure.confidence,
        structure.algorithm
    );
    for section in &structure.sections {
        println!(
            "    {:>7.2} - {:>7.2}  {:<10} conf={:.2} energy={:.3}",
            section.start_time, section.end_time, section.label, section.confidence, section.energy_level
        );
    }

    Ok(())
}
