use std::path::PathBuf;

use replay::{audit_bars, load_payload_bars};
use zen::ContainmentPolicy;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("usage: cargo run -q -p replay --bin audit_inclusion -- <payload_json> [inclusive|strict]");
        std::process::exit(2);
    }

    let path = PathBuf::from(&args[1]);
    let policy = if args.len() >= 3 {
        ContainmentPolicy::parse(&args[2])?
    } else {
        ContainmentPolicy::Inclusive
    };

    let bars = load_payload_bars(&path)?;
    let violations = audit_bars(&bars, policy);
    if violations.is_empty() {
        println!("{} bars audited, no violations", bars.len());
        return Ok(());
    }

    for item in &violations {
        println!("{item}");
    }
    println!("{} violations in {} bars", violations.len(), bars.len());
    std::process::exit(1);
}
