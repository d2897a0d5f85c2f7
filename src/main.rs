// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use anyhow::{anyhow, bail, Result};
use drumgrid::config::AppConfig;
use drumgrid::share::{share_link, take_pattern_param};
use drumgrid::{DrumPattern, LogAudio, Session, Subdivision};
use std::env;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

fn print_usage() {
    println!("drumgrid - Rhythm pattern editor");
    println!();
    println!("Usage: drumgrid [--config <PATH>] <COMMAND>");
    println!();
    println!("Commands:");
    println!("  --new [BARS] [SUBDIVISION]       Create an empty pattern and print its link");
    println!("  --decode <LINK>                  Show the pattern in a link or share string");
    println!("  --play <LINK> [SECONDS]          Play a pattern (default 8 seconds)");
    println!("  --convert <LINK> <SUBDIVISION>   Change subdivision and print the new link");
    println!("  --help                           Show this help message");
    println!();
    println!("Subdivisions: quarter, eighth, sixteenth, thirty-second,");
    println!("              quarter-triplet, eighth-triplet, sixteenth-triplet,");
    println!("              thirty-second-triplet (or 4n, 8n, 16n, 32n, 4t, 8t, 16t, 32t)");
}

fn init_logging(config: &AppConfig) {
    tracing_subscriber::fmt()
        .with_max_level(config.logging.max_level())
        .with_writer(std::io::stderr)
        .init();
}

/// Accept either a full URL with a `pattern` parameter or a bare share string
fn read_link(config: &AppConfig, link: &str) -> Result<DrumPattern> {
    let encoded = match take_pattern_param(link) {
        (Some(value), _) => value,
        (None, _) => link.to_string(),
    };
    config
        .codec()
        .try_decode(&encoded)
        .map_err(|e| anyhow!("Could not decode pattern: {}", e))
}

fn print_link(config: &AppConfig, pattern: &DrumPattern) -> Result<()> {
    let codec = config.codec();
    let link = match config.share.base_url.as_deref() {
        Some(base) => share_link(base, pattern, &codec),
        None => codec.encode(pattern),
    };
    match link {
        Some(link) => println!("{}", link),
        None => bail!("Pattern is too large to share"),
    }
    Ok(())
}

fn new_pattern(config: &AppConfig, bars: Option<&String>, subdivision: Option<&String>) -> Result<()> {
    let mut config = config.clone();
    if let Some(bars) = bars {
        config.pattern.bars = bars
            .parse()
            .map_err(|_| anyhow!("Invalid bar count: {}", bars))?;
    }
    if let Some(subdivision) = subdivision {
        config.pattern.subdivision = subdivision.parse::<Subdivision>().map_err(|e| anyhow!(e))?;
    }
    config.validate()?;

    let pattern = config.new_pattern();
    print!("{}", pattern.to_grid_string());
    print_link(&config, &pattern)
}

fn decode_pattern(config: &AppConfig, link: &str) -> Result<()> {
    let pattern = read_link(config, link)?;
    println!("id: {}", pattern.id());
    println!("active steps: {}", pattern.active_step_count());
    print!("{}", pattern.to_grid_string());
    Ok(())
}

fn convert_pattern(config: &AppConfig, link: &str, subdivision: &str) -> Result<()> {
    let mut pattern = read_link(config, link)?;
    let target: Subdivision = subdivision.parse().map_err(|e: String| anyhow!(e))?;
    let report = pattern.set_subdivision(target);

    println!(
        "{} -> {}: kept {}, dropped {} ({} collisions, {} past the end)",
        report.from,
        report.to,
        report.kept,
        report.dropped(),
        report.collisions,
        report.off_grid
    );
    print!("{}", pattern.to_grid_string());
    print_link(config, &pattern)
}

fn play_pattern(config: &AppConfig, link: &str, run_duration: Duration) -> Result<()> {
    let pattern = read_link(config, link)?;
    let mut session = Session::new(LogAudio::new()).with_codec(config.codec());
    session.load_pattern(pattern);
    session.set_looping(config.transport.looping);

    let snapshot = session.snapshot();
    println!(
        "Playing at {} BPM for {:.1}s (press Ctrl+C to stop)...",
        snapshot.bpm,
        run_duration.as_secs_f64()
    );
    session.play();

    let start_time = Instant::now();
    let mut last_tick = start_time;
    let mut last_step = None;

    while start_time.elapsed() < run_duration && session.snapshot().is_playing {
        let now = Instant::now();
        session.advance(now.duration_since(last_tick).as_secs_f64());
        last_tick = now;

        let frame = session.render_frame();
        if last_step != Some(frame.current_step) {
            last_step = Some(frame.current_step);
            println!("step {:>2} @ {:.3}s", frame.current_step + 1, frame.position);
        }

        // Small sleep to prevent busy-waiting
        thread::sleep(Duration::from_millis(1));
    }

    session.stop();
    println!("Played {} hits", session.audio().triggered());
    Ok(())
}

/// Playback length in seconds; rejects negative, NaN and unrepresentable values
fn parse_duration(value: &str) -> Result<Duration> {
    let seconds: f64 = value
        .parse()
        .map_err(|_| anyhow!("Invalid duration: {}", value))?;
    Duration::try_from_secs_f64(seconds).map_err(|_| anyhow!("Invalid duration: {}", value))
}

fn required<'a>(args: &'a [String], index: usize, message: &str) -> &'a str {
    match args.get(index) {
        Some(value) => value,
        None => {
            eprintln!("Error: {}", message);
            print_usage();
            std::process::exit(1);
        }
    }
}

fn main() -> Result<()> {
    let mut args: Vec<String> = env::args().skip(1).collect();

    let config = if args.first().map(String::as_str) == Some("--config") {
        if args.len() < 2 {
            eprintln!("Error: --config requires a path");
            std::process::exit(1);
        }
        let path = args[1].clone();
        args.drain(..2);
        AppConfig::load(Path::new(&path))?
    } else {
        AppConfig::default()
    };
    init_logging(&config);

    if args.is_empty() {
        println!("drumgrid - Rhythm pattern editor");
        println!("Run with --help for usage information");
        return Ok(());
    }

    match args[0].as_str() {
        "--new" => {
            new_pattern(&config, args.get(1), args.get(2))?;
        }
        "--decode" => {
            let link = required(&args, 1, "--decode requires a link");
            decode_pattern(&config, link)?;
        }
        "--play" => {
            let link = required(&args, 1, "--play requires a link");
            let run_duration = match args.get(2) {
                Some(value) => parse_duration(value)?,
                None => Duration::from_secs(8),
            };
            play_pattern(&config, link, run_duration)?;
        }
        "--convert" => {
            let link = required(&args, 1, "--convert requires a link and a subdivision");
            let subdivision = required(&args, 2, "--convert requires a link and a subdivision");
            convert_pattern(&config, link, subdivision)?;
        }
        "--help" | "-h" => {
            print_usage();
        }
        _ => {
            eprintln!("Unknown option: {}", args[0]);
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}
