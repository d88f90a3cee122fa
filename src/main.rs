//! clipscope - inspection tool for captured clipboard payloads.
//!
//! Reads capture files from disk and prints what the library finds in them.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use clipscope::config::InspectConfig;
use clipscope::inspect::{ContainerReport, inspect};
use clipscope::stability::{self, StabilityReport};
use clipscope::strings::extract_strings;
use clipscope::styles::{StyleArrayResult, find_style_candidates, parse_style_arrays};
use clipscope::tags::{TagHistogram, scan_tags, tag_name};
use clipscope::{SignatureKind, decompress_cws};

const MAX_LISTED_DIFF_RANGES: usize = 50;

#[derive(Parser, Debug)]
#[command(name = "clipscope")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// JSON file with InspectConfig overrides
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Signatures, embedded container and style tables of one capture
    Inspect { file: PathBuf },

    /// Decode the picture style tables
    Styles {
        file: PathBuf,
        /// Table offset (decimal or 0x-prefixed hex)
        #[arg(long, value_parser = parse_number)]
        offset: Option<usize>,
        /// Also list offsets that look like legacy style headers
        #[arg(long)]
        candidates: bool,
    },

    /// Tag histogram of an FWS or CWS container
    Tags { file: PathBuf },

    /// Expand a CWS container into FWS
    Decompress { input: PathBuf, output: PathBuf },

    /// Compare repeated captures of the same payload
    Stability {
        #[arg(required = true, num_args = 2..)]
        files: Vec<PathBuf>,
        #[arg(long)]
        min_run: Option<usize>,
        #[arg(long, default_value_t = 30)]
        top: usize,
        /// Write stable.bin, mask.bin and summary.json here
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Differing ranges between two captures
    Diff {
        a: PathBuf,
        b: PathBuf,
        #[arg(long, default_value_t = 16)]
        context: usize,
    },

    /// Printable ASCII and UTF-16LE strings
    Strings {
        file: PathBuf,
        #[arg(long, value_parser = parse_number, default_value = "0")]
        start: usize,
        #[arg(long, value_parser = parse_number)]
        end: Option<usize>,
        #[arg(long)]
        min_len: Option<usize>,
    },
}

fn parse_number(s: &str) -> std::result::Result<usize, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid number '{s}': {e}"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Inspect { file } => {
            let data = read_capture(&file)?;
            let report = inspect(&data, &config);
            if cli.json {
                return print_json(&report);
            }
            println!("{}: len={} head={}", file.display(), report.length, report.head_hex);
            for m in &report.signatures {
                println!("  signature {:<9} at {:#06x}", m.kind, m.offset);
            }
            if let Some(container) = &report.container {
                print_container(container);
            }
            if let Some(styles) = &report.styles {
                print_styles(styles);
            }
        }

        Command::Styles {
            file,
            offset,
            candidates,
        } => {
            let data = read_capture(&file)?;
            let result = parse_style_arrays(&data, offset.unwrap_or(config.style_offset));
            let hits = candidates.then(|| find_style_candidates(&data));
            if cli.json {
                #[derive(Serialize)]
                struct Out {
                    styles: StyleArrayResult,
                    candidates: Option<Vec<usize>>,
                }
                return print_json(&Out {
                    styles: result,
                    candidates: hits,
                });
            }
            print_styles(&result);
            if let Some(hits) = hits {
                println!("  style-like offsets: {} first10={:x?}", hits.len(), &hits[..hits.len().min(10)]);
            }
        }

        Command::Tags { file } => {
            let data = read_capture(&file)?;
            let histogram = match SignatureKind::container_at_start(&data) {
                Some(SignatureKind::Cws) => scan_tags(&decompress_cws(&data)?),
                Some(SignatureKind::Fws) => scan_tags(&data),
                Some(SignatureKind::Zws) => bail!("LZMA-compressed containers are not supported"),
                _ => bail!("{} does not start with a container signature", file.display()),
            };
            if cli.json {
                return print_json(&histogram);
            }
            print_histogram(&histogram);
        }

        Command::Decompress { input, output } => {
            let data = read_capture(&input)?;
            let expanded = decompress_cws(&data)
                .with_context(|| format!("Failed to decompress {}", input.display()))?;
            fs::write(&output, &expanded)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            tracing::info!(
                input = %input.display(),
                output = %output.display(),
                bytes = expanded.len(),
                "container expanded"
            );
        }

        Command::Stability {
            files,
            min_run,
            top,
            out_dir,
        } => {
            let samples = files.iter().map(|f| read_capture(f)).collect::<Result<Vec<_>>>()?;
            let report = stability::analyze(&samples, min_run.unwrap_or(config.min_run_len))?;
            if let Some(dir) = &out_dir {
                write_stability_outputs(dir, &report)?;
            }
            if cli.json {
                return print_json(&report);
            }
            println!(
                "samples={} len={} stable={} ({:.2}%) runs={}",
                report.sample_count,
                report.length,
                report.stable_byte_count,
                report.stable_fraction * 100.0,
                report.runs.len()
            );
            for run in report.runs.iter().take(top) {
                println!("  {:#06x}..{:#06x} len={}", run.start, run.end.saturating_sub(1), run.len);
            }
        }

        Command::Diff { a, b, context } => {
            let da = read_capture(&a)?;
            let db = read_capture(&b)?;
            let ranges = stability::diff_ranges(&[&da[..], &db[..]]);
            if cli.json {
                #[derive(Serialize)]
                struct Out {
                    a: stability::CaptureFingerprint,
                    b: stability::CaptureFingerprint,
                    diff_bytes: usize,
                    ranges: Vec<(usize, usize)>,
                }
                return print_json(&Out {
                    a: stability::fingerprint(&da),
                    b: stability::fingerprint(&db),
                    diff_bytes: stability::total_diff(&da, &db),
                    ranges: ranges.iter().map(|r| (*r.start(), *r.end())).collect(),
                });
            }
            println!(
                "lenA={} lenB={} diffBytes={} ranges={}",
                da.len(),
                db.len(),
                stability::total_diff(&da, &db),
                ranges.len()
            );
            let common = da.len().min(db.len());
            for range in ranges.iter().take(MAX_LISTED_DIFF_RANGES) {
                let shown = stability::context_window(range, context, common);
                println!();
                println!(
                    "{:#06x}..{:#06x} (show {:#06x}..{:#06x})",
                    range.start(),
                    range.end(),
                    shown.start,
                    shown.end.saturating_sub(1)
                );
                println!("A:{}", hex::encode(&da[shown.clone()]));
                println!("B:{}", hex::encode(&db[shown]));
            }
        }

        Command::Strings {
            file,
            start,
            end,
            min_len,
        } => {
            let data = read_capture(&file)?;
            let end = end.unwrap_or(data.len());
            let found = extract_strings(&data, start..end, min_len.unwrap_or(config.string_min_len));
            if cli.json {
                return print_json(&found);
            }
            for s in &found {
                println!("{:<6} {:#06x}: {}", format!("{:?}", s.encoding), s.offset, s.text);
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<InspectConfig> {
    let Some(path) = path else {
        return Ok(InspectConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    InspectConfig::from_json(&text).with_context(|| format!("Invalid config {}", path.display()))
}

fn read_capture(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read capture {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn write_stability_outputs(dir: &Path, report: &StabilityReport) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    fs::write(dir.join("stable.bin"), &report.stable_bytes)?;
    fs::write(dir.join("mask.bin"), report.mask_bytes())?;
    fs::write(dir.join("summary.json"), serde_json::to_vec_pretty(report)?)?;
    tracing::info!(dir = %dir.display(), "stability outputs written");
    Ok(())
}

fn print_container(container: &ContainerReport) {
    println!(
        "  container {} at {:#06x} version={:?} declared_len={:?}",
        container.kind, container.offset, container.version, container.declared_length
    );
    if let Some(note) = &container.note {
        println!("    note: {note}");
    }
    if let Some(histogram) = &container.histogram {
        print_histogram(histogram);
    }
}

fn print_histogram(histogram: &TagHistogram) {
    println!(
        "    tags={} distinct={} stop={:?} end={:#x}",
        histogram.total_tags,
        histogram.counts.len(),
        histogram.stop,
        histogram.end_offset
    );
    for (code, count) in &histogram.counts {
        println!("      {:>4} {:<28} x{}", code, tag_name(*code).unwrap_or("?"), count);
    }
}

fn print_styles(result: &StyleArrayResult) {
    match result {
        Ok(styles) => {
            println!(
                "  styles ({}) at {:#x}: {} bytes",
                styles.layout, styles.style_offset, styles.bytes_consumed
            );
            let fills: Vec<String> = styles.fills.iter().map(|f| f.color.hex()).collect();
            println!("    fills: count={} {:?}", styles.fill_count, fills);
            let lines: Vec<String> = styles
                .lines
                .iter()
                .map(|l| format!("{}px {}", l.width_px(), l.color))
                .collect();
            println!("    lines: count={} {:?}", styles.line_count, lines);
            for warning in &styles.warnings {
                println!("    warning: {warning}");
            }
        }
        Err(failure) => println!("  styles: {failure}"),
    }
}
