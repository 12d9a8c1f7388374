use std::path::PathBuf;

use market::{delete_files_with_suffix, prepare_folder};
use zen::{ZenConfig, init_logging_with};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("usage: cargo run -p replay --bin prepare_dataset -- <folder> [--clear <suffix>]");
        std::process::exit(2);
    }

    let config = ZenConfig::resolve()?;
    init_logging_with(&config.log_level);

    let folder = PathBuf::from(&args[1]);
    if args.len() >= 4 && args[2] == "--clear" {
        let count = delete_files_with_suffix(&folder, &args[3]);
        println!("deleted {} {} files", count, args[3]);
        return Ok(());
    }

    let report = prepare_folder(&folder)?;
    println!(
        "finished={} temp={} contracts={}",
        report.finished.len(),
        report.temp.len(),
        report.contracts.len()
    );
    for path in &report.contracts {
        println!("{}", path.display());
    }
    Ok(())
}
