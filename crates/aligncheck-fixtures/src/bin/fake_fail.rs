//! Stand-in alignment tool that fails: creates `--output` with a partial
//! file, prints a traceback to stderr and exits with `--exit-code` (default 1).

// Test fixtures require special allowances - they are not production code
#![allow(clippy::print_stderr)]
#![allow(clippy::exit)]

use std::fs;
use std::path::Path;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let value_of = |name: &str| {
        args.iter()
            .position(|arg| arg == name)
            .and_then(|index| args.get(index + 1))
    };

    if let Some(output) = value_of("--output") {
        if fs::create_dir(output).is_ok() {
            let _ = fs::write(Path::new(output).join("partial.nexus"), "#NEXUS\n");
        }
    }

    let code = value_of("--exit-code")
        .and_then(|value| value.parse::<i32>().ok())
        .unwrap_or(1);
    eprintln!("Traceback (most recent call last):");
    eprintln!("  File \"phyluce/align.py\", line 42, in main");
    eprintln!("ValueError: simulated alignment failure");
    std::process::exit(code);
}
