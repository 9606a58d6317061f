use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use nova_groovy_debug::{prepare, GroovyDebugConfig, ProjectIndex, SourcePosition};

/// Inspect how the Groovy debugger resolves source files.
#[derive(Debug, Parser)]
#[command(name = "nova-groovy-debug", version, about)]
struct Cli {
    /// Path to a TOML config file.
    ///
    /// If unset, `NOVA_GROOVY_DEBUG_CONFIG` is used as a fallback. When neither
    /// is provided the defaults are used.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the type and member scopes found in a Groovy file.
    Outline { file: PathBuf },
    /// Print the class-prepare pattern a breakpoint on `line` (one-based)
    /// would register.
    Pattern { file: PathBuf, line: u32 },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config);
    nova_groovy_debug::init_tracing(&config.logging);

    match cli.command {
        Command::Outline { file } => outline(&file),
        Command::Pattern { file, line } => pattern(&config, &file, line),
    }
}

fn load_config(cli_path: Option<PathBuf>) -> GroovyDebugConfig {
    let path = cli_path.or_else(|| std::env::var_os("NOVA_GROOVY_DEBUG_CONFIG").map(PathBuf::from));
    let Some(path) = path else {
        return GroovyDebugConfig::default();
    };

    match GroovyDebugConfig::load_from_path(&path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!(
                "nova-groovy-debug: failed to load config from {}: {err}; continuing with defaults",
                path.display()
            );
            GroovyDebugConfig::default()
        }
    }
}

fn index_single_file(path: &Path) -> anyhow::Result<(ProjectIndex, nova_groovy_debug::FileId)> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut index = ProjectIndex::new();
    let module = index.add_module("main");
    let file = index.add_file(module, path, text)?;
    Ok((index, file))
}

fn outline(path: &Path) -> anyhow::Result<()> {
    let (index, file) = index_single_file(path)?;
    let source = index
        .file(file)
        .context("indexed file disappeared from the index")?;
    if !source.is_groovy() {
        anyhow::bail!("{} is not a Groovy source file", path.display());
    }

    let scopes = source.scopes();
    for (id, node) in scopes.iter() {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = scopes.parent(current) {
            depth += 1;
            current = parent;
            if depth >= scopes.len() {
                break;
            }
        }
        let line = source.line_index().line_of(node.range.start()) + 1;
        let name = node
            .qualified_name
            .as_deref()
            .or(node.name.as_deref())
            .unwrap_or("<unnamed>");
        println!("{:indent$}{:?} {name} (line {line})", "", node.kind, indent = depth * 2);
    }
    Ok(())
}

fn pattern(config: &GroovyDebugConfig, path: &Path, line: u32) -> anyhow::Result<()> {
    let line = line
        .checked_sub(1)
        .context("line numbers start at 1")?;
    let (index, file) = index_single_file(path)?;
    let position = SourcePosition::from_line(file, line);
    match prepare::plan(&index, &config.resolution, &position) {
        Some(plan) => println!("{}", plan.pattern()),
        None => anyhow::bail!("no class can be prepared for {}:{}", path.display(), line + 1),
    }
    Ok(())
}
