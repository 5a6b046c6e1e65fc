//! Stand-in alignment tool: copies every alignment under `--alignments` into
//! a new `--output` directory, renaming each file to the `--output-format`
//! extension. Files named by `--match-count-output` or `--incomplete-matrix`
//! must exist. Like the phyluce tools it refuses an existing output directory
//! and logs to `<program>.log` in its working directory.

// Test fixtures require special allowances - they are not production code
#![allow(clippy::print_stderr)]
#![allow(clippy::exit)]

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

fn main() {
    if let Err(err) = run() {
        eprintln!("ERROR: {err}");
        std::process::exit(1);
    }
}

fn run() -> io::Result<()> {
    let mut args = std::env::args();
    let program = args.next().map(PathBuf::from).unwrap_or_default();
    let flags = parse_flags(args)?;
    let alignments = required(&flags, "--alignments")?;
    let output = required(&flags, "--output")?;

    for name in ["--match-count-output", "--incomplete-matrix"] {
        if let Some(path) = flags.get(name) {
            fs::metadata(path).map_err(|err| {
                io::Error::new(err.kind(), format!("{name} {path}: {err}"))
            })?;
        }
    }

    fs::create_dir(output)?;
    let mut inputs: Vec<PathBuf> = fs::read_dir(alignments)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    inputs.sort();
    for input in &inputs {
        let Some(name) = input.file_name() else {
            continue;
        };
        let mut target = Path::new(output).join(name);
        if let Some(format) = flags.get("--output-format") {
            target.set_extension(format);
        }
        fs::copy(input, &target)?;
    }

    let stem = program
        .file_stem()
        .map_or_else(|| "fake_convert".into(), |s| s.to_string_lossy());
    fs::write(
        format!("{stem}.log"),
        format!("{stem}: wrote {} alignments to {output}\n", inputs.len()),
    )
}

fn parse_flags(args: impl Iterator<Item = String>) -> io::Result<BTreeMap<String, String>> {
    let mut flags = BTreeMap::new();
    let mut args = args.peekable();
    while let Some(arg) = args.next() {
        if !arg.starts_with("--") {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unexpected argument `{arg}`"),
            ));
        }
        let value = match args.peek() {
            Some(next) if !next.starts_with("--") => args.next().unwrap_or_default(),
            _ => String::from("true"),
        };
        flags.insert(arg, value);
    }
    Ok(flags)
}

fn required<'a>(flags: &'a BTreeMap<String, String>, name: &str) -> io::Result<&'a str> {
    flags
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, format!("missing {name}")))
}
