use std::path::PathBuf;

use replay::{ExportOptions, batch_export, export_file, export_path};
use zen::{ZenConfig, init_logging_with};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!(
            "usage: cargo run -p replay --bin export_zen_structures -- <file_or_folder> [output] [--parquet] [--workers N]"
        );
        std::process::exit(2);
    }

    let config = ZenConfig::resolve()?;
    init_logging_with(&config.log_level);

    let input = PathBuf::from(&args[1]);
    let mut output: Option<PathBuf> = None;
    let mut parquet = false;
    let mut workers = 4usize;
    let mut rest = args[2..].iter();
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--parquet" => parquet = true,
            "--workers" => {
                let Some(value) = rest.next() else {
                    return Err("--workers needs a value".into());
                };
                workers = value.parse()?;
            }
            other => output = Some(PathBuf::from(other)),
        }
    }

    let options = ExportOptions { config, parquet };
    if input.is_dir() {
        let out_dir = output.unwrap_or_else(|| input.clone());
        let report = batch_export(&input, &out_dir, &options, workers)?;
        for summary in &report.exported {
            println!(
                "{} -> {} bars={} top={} bottom={} confirmed={} dropped={}",
                summary.symbol,
                summary.output.display(),
                summary.bars,
                summary.tops,
                summary.bottoms,
                summary.confirmed,
                summary.dropped
            );
        }
        for (file, err) in &report.failed {
            eprintln!("failed {}: {}", file.display(), err);
        }
        if !report.failed.is_empty() {
            std::process::exit(1);
        }
    } else {
        let out_dir = input.parent().map(PathBuf::from).unwrap_or_default();
        let output = output.unwrap_or_else(|| export_path(&out_dir, &input));
        let summary = export_file(&input, &output, &options)?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}
