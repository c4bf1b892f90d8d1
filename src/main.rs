//! Animation inspector - Summarize keyframe animation files.

use std::fs;
use std::path::PathBuf;

use attractor_anim::{
    animation::{AnimationCodec, KeyframeStore, TimelineCursor},
    curve::Spline,
    schema::{AnimationConfig, DeJongParams},
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "--example" {
        print_example_config();
        return;
    }

    if args.len() < 2 {
        eprintln!("Usage: {} <animation> [config.json]", args[0]);
        eprintln!();
        eprintln!("Summarize a keyframe animation file.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  animation    Path to the animation file");
        eprintln!("  config.json  Optional animation configuration");
        eprintln!();
        eprintln!("Example configuration is printed with the --example flag.");
        std::process::exit(1);
    }

    let anim_path = PathBuf::from(&args[1]);

    let config = match args.get(2) {
        Some(path) => {
            let config_str = fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("Error reading config file: {}", e);
                std::process::exit(1);
            });
            serde_json::from_str(&config_str).unwrap_or_else(|e| {
                eprintln!("Error parsing config: {}", e);
                std::process::exit(1);
            })
        }
        None => AnimationConfig::default(),
    };
    if let Err(e) = config.validate() {
        eprintln!("Invalid config: {}", e);
        std::process::exit(1);
    }

    let mut store = KeyframeStore::from_config(&config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    let codec = AnimationCodec::new(config.codec.clone());
    let report = codec.load_file(&mut store, &anim_path).unwrap_or_else(|e| {
        eprintln!("Error loading {}: {}", anim_path.display(), e);
        std::process::exit(1);
    });

    println!("Animation: {}", anim_path.display());
    println!("====================");
    println!("Keyframes: {}", store.len());
    println!("Length: {:.3}s", store.total_length());
    println!();

    let default_curve = Spline::smooth();
    let mut start = 0.0;
    for (i, keyframe) in store.iter().enumerate() {
        let curve = if keyframe.curve() == &default_curve {
            "smooth".to_string()
        } else {
            format!("custom ({} points)", keyframe.curve().points().len())
        };
        println!(
            "  #{:<3} at {:>8.3}s  duration {:>7.3}s  params {:>5} bytes  thumbnail {:<3}  curve {}",
            i,
            start,
            keyframe.duration(),
            keyframe.parameters().len(),
            if keyframe.thumbnail().is_some() { "yes" } else { "no" },
            curve
        );
        start += keyframe.duration();
    }

    if !report.is_clean() {
        println!();
        println!("Warnings:");
        for skipped in &report.skipped {
            println!("  skipped {} chunk: {}", skipped.tag, skipped.error);
        }
        for tag in &report.unknown {
            println!("  unknown chunk type {}", tag);
        }
        if report.truncated {
            println!("  file ends inside a keyframe");
        }
    }

    let mut cursor = TimelineCursor::start(&store);
    let frames = cursor
        .frames::<DeJongParams>(&store, config.frame_rate)
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });
    let mut count = 0usize;
    for frame in frames {
        if let Err(e) = frame {
            eprintln!("Error sampling frame {}: {}", count, e);
            std::process::exit(1);
        }
        count += 1;
    }
    println!();
    println!("Frames at {} fps: {}", config.frame_rate, count);
}

fn print_example_config() {
    let config = AnimationConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}
