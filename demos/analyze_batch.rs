//! Example: Analyze multiple WAV files in parallel
//!
//! Usage:
//!   cargo run --release --example analyze_batch -- [--jobs N] [--json] <file1.wav> <file2.wav> ...
//!
//! Notes:
//! - Parallelism is across files (batch-level). Each file analysis is still single-threaded.
//! - Default workers: (available CPU threads - 1), keeping one core free for the system.
//! - One `BeatgridEngine` is built per file; a shared engine would serialize the
//!   whole batch behind its in-flight guard.

use cuepoint_dsp::{AnalysisConfig, BeatgridEngine, SampleBuffer, StructureAnalyzer};
use rayon::prelude::*;
use serde::Serialize;
use std::env;
use std::time::Instant;

fn load_wav(path: &str) -> Result<SampleBuffer, Box<dyn std::error::Error + Send + Sync>> {
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

fn default_jobs() -> usize {
    let n = std::thread::available_parallelism().map(|v| v.get()).unwrap_or(1);
    std::cmp::max(1, n.saturating_sub(1))
}

fn percentile(mut xs: Vec<f32>, p: f32) -> Option<f32> {
    if xs.is_empty() {
        return None;
    }
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let idx = ((xs.len() - 1) as f32 * p.clamp(0.0, 1.0)).round() as usize;
    Some(xs[idx.min(xs.len() - 1)])
}

#[derive(Debug, Clone, Serialize)]
struct ItemOut {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    bpm: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bpm_confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sections: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    structure_confidence: Option<f32>,
    processing_time_ms: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

fn analyze_one(path: &str, config: &AnalysisConfig) -> ItemOut {
    let t0 = Instant::now();
    let mut out = ItemOut {
        file: path.to_string(),
        bpm: None,
        bpm_confidence: None,
        sections: None,
        structure_confidence: None,
        processing_time_ms: 0.0,
        errors: Vec::new(),
    };

    let buffer = match load_wav(path) {
        Ok(buffer) => buffer,
        Err(e) => {
            out.errors.push(format!("decode failed: {e}"));
            return out;
        }
    };

    match BeatgridEngine::new(config.beatgrid.clone()).and_then(|engine| engine.analyze(&buffer)) {
        Ok(grid) => {
            out.bpm = Some(grid.bpm);
            out.bpm_confidence = Some(grid.confidence);
        }
        Err(e) => out.errors.push(format!("beatgrid failed: {e}")),
    }
    match StructureAnalyzer::new(config.structure.clone()).and_then(|analyzer| analyzer.analyze(&buffer)) {
        Ok(structure) => {
            out.sections = Some(structure.sections.len());
            out.structure_confidence = Some(structure.confidence);
        }
        Err(e) => out.errors.push(format!("structure failed: {e}")),
    }

    out.processing_time_ms = t0.elapsed().as_secs_f32() * 1000.0;
    out
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut json = false;
    let mut jobs: Option<usize> = None;
    let mut paths: Vec<String> = Vec::new();

    let mut args = env::args().skip(1);
    while let Some(a) = args.next() {
        match a.as_str() {
            "--json" => json = true,
            "--jobs" => {
                let v = args.next().ok_or("--jobs requires a value")?.parse::<usize>()?;
                jobs = Some(std::cmp::max(1, v));
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: analyze_batch [--jobs N] [--json] <file1.wav> <file2.wav> ...\n\
                     \n\
                     --jobs N   Parallel workers (default: CPU-1)\n\
                     --json     Emit one JSON object per line (JSONL)\n"
                );
                return Ok(());
            }
            _ => paths.push(a),
        }
    }

    if paths.is_empty() {
        eprintln!("ERROR: Provide at least one WAV file path. Use --help for usage.");
        std::process::exit(2);
    }

    let jobs = jobs.unwrap_or_else(default_jobs);
    eprintln!("Batch: {} files, jobs={}", paths.len(), jobs);

    let config = AnalysisConfig::default();
    let t0 = Instant::now();
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;

    let outs: Vec<ItemOut> = pool.install(|| paths.par_iter().map(|path| analyze_one(path, &config)).collect());

    for (idx, o) in outs.iter().enumerate() {
        if json {
            println!("{}", serde_json::to_string(o)?);
            continue;
        }
        let bpm = o
            .bpm
            .map(|b| format!("{:.2} (conf={:.3})", b, o.bpm_confidence.unwrap_or(0.0)))
            .unwrap_or_else(|| "-".to_string());
        let sections = o.sections.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string());
        println!(
            "[{}/{}] {}: BPM={} sections={} time={:.2}ms",
            idx + 1,
            outs.len(),
            o.file,
            bpm,
            sections,
            o.processing_time_ms
        );
        for e in &o.errors {
            println!("    ERROR: {}", e);
        }
    }

    let ok_times: Vec<f32> = outs
        .iter()
        .filter(|o| o.errors.is_empty())
        .map(|o| o.processing_time_ms)
        .collect();
    let wall_ms = t0.elapsed().as_secs_f64() * 1000.0;

    eprintln!("Done: ok={}/{} wall={:.0}ms", ok_times.len(), outs.len(), wall_ms);
    if !ok_times.is_empty() {
        let mean = ok_times.iter().sum::<f32>() / ok_times.len() as f32;
        let p50 = percentile(ok_times.clone(), 0.50).unwrap_or(mean);
        let p90 = percentile(ok_times.clone(), 0.90).unwrap_or(mean);
        eprintln!("processing_time_ms: mean={:.2} p50={:.2} p90={:.2}", mean, p50, p90);
    }

    Ok(())
}
