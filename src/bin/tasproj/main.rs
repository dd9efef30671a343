//! tasproj CLI - Tool for inspecting and rewriting TAS editor project files.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use tasproj::container::{scan_container, IStream, PROJECT_EXTENSION};
use tasproj::prelude::*;

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = "info";
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "off",
            _ => filtered_args.push(arg),
        }
    }
    init_logging(level);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    let result = match filtered_args[0] {
        "info" | "i" => match filtered_args.get(1) {
            Some(file) => cmd_info(file),
            None => usage("tasproj info <file.fm3>"),
        },
        "compact" | "c" => match (filtered_args.get(1), filtered_args.get(2)) {
            (Some(input), Some(output)) => cmd_compact(input, output, &filtered_args[3..]),
            _ => usage("tasproj compact <in.fm3> <out.fm3> [--text|--binary] [--modules a,b,...]"),
        },
        "new" | "n" => match filtered_args.get(1) {
            Some(file) => cmd_new(file, filtered_args[2..].contains(&"--fourscore")),
            None => usage("tasproj new <file.fm3> [--fourscore]"),
        },
        "version" | "-V" | "--version" => {
            println!("tasproj {} (built {})", env!("CARGO_PKG_VERSION"), env!("TASPROJ_BUILD_DATE"));
            Ok(())
        }
        "help" | "h" | "-h" | "--help" => {
            print_help();
            Ok(())
        }

        // Default: if file exists, show info; otherwise error
        other => {
            if Path::new(other).exists() {
                cmd_info(other)
            } else {
                eprintln!("Unknown command: {}", other);
                eprintln!();
                print_help();
                std::process::exit(1);
            }
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn usage(text: &str) -> Result<()> {
    bail!("missing arguments\nUsage: {}", text)
}

fn print_help() {
    println!("tasproj - TAS editor project toolkit");
    println!();
    println!("USAGE:");
    println!("    tasproj [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    i, info    <file>              Show movie header and module layout");
    println!("    c, compact <in> <out> [opts]   Re-save keeping only chosen modules");
    println!("    n, new     <file> [--fourscore] Write an empty project (.fm3 added if no extension)");
    println!("    version                        Show version and build date");
    println!("    h, help                        Show this help");
    println!();
    println!("COMPACT OPTIONS:");
    println!("    --text             Store records as text lines");
    println!("    --binary           Store records raw");
    println!("    --modules a,b,...  Modules to keep: {}", module_names());
    println!("                       (defaults come from the settings file)");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (very verbose)");
    println!("    -q, --quiet      Suppress log output");
    println!();
    println!("NOTES:");
    println!("    - Passing a project file directly is equivalent to 'info'");
    println!("    - RUST_LOG overrides the log level flags");
}

fn module_names() -> String {
    ModuleId::ALL.iter().map(|id| id.name()).collect::<Vec<_>>().join(",")
}

fn cmd_info(path: &str) -> Result<()> {
    info!("Opening project: {}", path);
    let stream = IStream::open(path).with_context(|| format!("failed to open {}", path))?;
    debug!(bytes = stream.size(), mapped = stream.is_mapped(), "project opened");

    let info = scan_container(stream.bytes(), &Fm2Format).with_context(|| format!("failed to read {}", path))?;
    let movie = &info.movie;

    println!("Project: {}", path);
    println!("Size:    {} bytes", stream.size());
    println!();
    println!("Movie:");
    println!("  Format version:  {}", movie.version);
    println!("  Emulator:        {}", movie.emu_version);
    println!("  ROM:             {}", movie.rom_filename);
    println!("  Frames:          {}", movie.len());
    println!("  Rerecords:       {}", movie.rerecord_count);
    println!("  Input:           {:?}", movie.input_type());
    println!("  Region:          {}", if movie.pal { "PAL" } else { "NTSC" });
    println!("  Subtitles:       {}", movie.subtitles.len());
    println!("  Block size:      {} bytes", info.movie_bytes);
    println!();

    match info.selection {
        Some(selection) => println!("Modules (saved: {}):", selection),
        None => println!("Modules: (no module section)"),
    }
    for (id, size) in &info.blocks {
        match size {
            Some(0) => println!("  {:<12} placeholder", id.name()),
            Some(bytes) => println!("  {:<12} {} bytes", id.name(), bytes),
            None => println!("  {:<12} missing", id.name()),
        }
    }
    if info.trailing_bytes > 0 {
        println!("  (+{} bytes from unknown modules)", info.trailing_bytes);
    }
    if info.truncated {
        println!("  WARNING: file is truncated");
    }
    Ok(())
}

fn cmd_compact(input: &str, output: &str, opts: &[&str]) -> Result<()> {
    let mut options = Settings::load().compact_options();

    let mut iter = opts.iter();
    while let Some(&opt) = iter.next() {
        match opt {
            "--text" => options.binary = false,
            "--binary" => options.binary = true,
            "--modules" | "-m" => {
                let list = iter.next().context("--modules needs a list")?;
                options.modules = ModuleSelection::from_names(list.split(','))
                    .with_context(|| format!("unknown module in '{}', expected {}", list, module_names()))?;
            }
            other => bail!("unknown compact option: {}", other),
        }
    }

    let mut project = Project::builder().autosave(AutosaveConfig::disabled()).build();
    let report = project.load(input).with_context(|| format!("failed to load {}", input))?;
    for (id, err) in report.failures() {
        eprintln!("Warning: {} dropped: {}", id, err);
    }

    let written = project
        .save_compact(output, &options)
        .with_context(|| format!("failed to write {}", output))?;
    info!("Wrote {} ({} bytes, modules: {})", output, written, options.modules);
    Ok(())
}

fn cmd_new(path: &str, fourscore: bool) -> Result<()> {
    let mut path = PathBuf::from(path);
    if path.extension().is_none() {
        path.set_extension(PROJECT_EXTENSION);
    }
    let path = path.as_path();

    let mut project = Project::builder().autosave(AutosaveConfig::disabled()).build();
    if fourscore {
        project.movie_mut().set_input_type(InputType::FourScore);
    }
    project.save_as(path).with_context(|| format!("failed to write {}", path.display()))?;

    let mut settings = Settings::load();
    settings.add_recent(path.to_path_buf());
    if let Err(e) = settings.save() {
        debug!(error = %e, "could not update recent projects");
    }

    info!("Created {} (companion movie name: {})", path.display(), project.companion_file_name());
    Ok(())
}
