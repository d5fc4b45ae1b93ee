#![cfg(feature = "cli")]

use clap::Parser;
use cwrap_tools::convert_header_file;
use std::path::PathBuf;
use std::process::ExitCode;

/// Parse a Dear ImGui style C++ header, convert it to C, and output
/// metadata.
///
/// Result code 0 is returned on success, 1 on conversion failure and 2 on
/// parameter errors.
#[derive(Parser)]
#[command(name = "cwrap")]
struct Options {
    /// Path to the source header file to process (generally imgui.h)
    src: PathBuf,
    /// Path to the output file(s). This should have no extension, as
    /// <output>.h, <output>.cpp and <output>.json will be written
    #[arg(short, long)]
    output: PathBuf,
    /// Path to the implementation template directory
    #[arg(short, long, default_value = "./templates")]
    templatedir: PathBuf,
}

fn main() -> ExitCode {
    // clap itself exits with code 2 on usage errors
    let opts = Options::parse();

    // The expected template name derives from the source filename; "header"
    // here means "file header", not "C header file"
    let stem = opts
        .src
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default();
    let template = opts.templatedir.join(format!("{stem}-header.cpp"));
    if !template.is_file() {
        eprintln!(
            "Implementation template file {} could not be found (note that template file names \
             are expected to match source file names, so if you have renamed the source header \
             you will need to rename the template as well)",
            template.display()
        );
        return ExitCode::from(2);
    }

    println!("Parsing {}", opts.src.display());
    match convert_header_file(&opts.src, &opts.output, &template) {
        Ok(()) => {
            println!("Done");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Exception during conversion:");
            eprintln!("{err:?}");
            ExitCode::from(1)
        }
    }
}
