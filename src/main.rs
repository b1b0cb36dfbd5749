//! Command-line tools for the PLC Modbus tag map: full-map generation,
//! data-type normalization and legacy schema conversion.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use plc_tagmap::tagmap::generate::generate_tag_map;
use plc_tagmap::tagmap::layout::MemoryLayout;
use plc_tagmap::tagmap::legacy::LegacyTagsFile;
use plc_tagmap::tagmap::normalize::normalize_types;
use plc_tagmap::tagmap::storage::{self, TAGS_FILE_NAME};

#[derive(Parser, Debug)]
#[command(name = "tagmap")]
#[command(version, about = "PLC Modbus tag map generator and maintenance tools", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the full tag map from the controller memory layout.
    Generate {
        /// Output file (full overwrite).
        #[arg(long, default_value = TAGS_FILE_NAME)]
        out: PathBuf,
        /// Memory layout override file (builtin table when absent).
        #[arg(long)]
        layout: Option<PathBuf>,
    },
    /// Recompute tag data types in an existing map and write a `.new` sibling.
    Normalize {
        /// Input tag map.
        #[arg(long, default_value = TAGS_FILE_NAME)]
        input: PathBuf,
        /// Output path (defaults to `<input>.new`; never the input itself).
        #[arg(long)]
        out: Option<PathBuf>,
        /// Memory layout override file (builtin table when absent).
        #[arg(long)]
        layout: Option<PathBuf>,
    },
    /// Convert between the canonical and the legacy numeric-coded schema.
    Convert {
        /// Input document.
        #[arg(long)]
        input: PathBuf,
        /// Output document.
        #[arg(long)]
        out: PathBuf,
        /// Target schema.
        #[arg(long, value_enum)]
        to: SchemaKind,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SchemaKind {
    /// String-coded camelCase document with `schemaVersion: 1`.
    Canonical,
    /// PascalCase document with integer register/type codes.
    Legacy,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::Generate { out, layout } => run_generate(&out, layout.as_deref()),
        Command::Normalize { input, out, layout } => {
            run_normalize(&input, out.as_deref(), layout.as_deref())
        }
        Command::Convert { input, out, to } => run_convert(&input, &out, to),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_layout(path: Option<&Path>) -> Result<MemoryLayout> {
    match path {
        Some(path) => MemoryLayout::load_from_file(path)
            .with_context(|| format!("failed to load memory layout from {}", path.display())),
        None => Ok(MemoryLayout::builtin()),
    }
}

fn run_generate(out: &Path, layout: Option<&Path>) -> Result<()> {
    let layout = load_layout(layout)?;
    let (config, summary) = generate_tag_map(&layout);
    storage::save_tags(out, &config)
        .with_context(|| format!("failed to write tag map to {}", out.display()))?;

    info!(
        total = summary.total,
        bit = summary.bit_tags,
        word = summary.word_tags,
        "tag map generated"
    );
    for (prefix, count) in &summary.per_family {
        info!("  {prefix}: {count} tags");
    }
    info!("written to {}", out.display());
    Ok(())
}

fn run_normalize(input: &Path, out: Option<&Path>, layout: Option<&Path>) -> Result<()> {
    let layout = load_layout(layout)?;
    let mut config = storage::load_tags(input)
        .with_context(|| format!("failed to load tag map from {}", input.display()))?;

    let summary = normalize_types(&layout, &mut config);

    let out_path = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| storage::normalized_output_path(input));
    if out_path == input {
        bail!("refusing to overwrite the input in place; promote the output manually");
    }
    storage::save_tags(&out_path, &config)
        .with_context(|| format!("failed to write normalized tag map to {}", out_path.display()))?;

    info!(
        total = summary.total,
        changed = summary.changed,
        skipped_overrides = summary.skipped_overrides,
        "tag types normalized"
    );
    info!(
        "review {} and promote it over {} manually",
        out_path.display(),
        input.display()
    );
    Ok(())
}

fn run_convert(input: &Path, out: &Path, to: SchemaKind) -> Result<()> {
    if input == out {
        bail!("refusing to convert a document onto itself");
    }
    match to {
        SchemaKind::Legacy => {
            let config = storage::load_tags(input)
                .with_context(|| format!("failed to load tag map from {}", input.display()))?;
            let legacy = LegacyTagsFile::from_canonical(&config);
            storage::save_legacy_tags(out, &legacy)
                .with_context(|| format!("failed to write {}", out.display()))?;
            info!(tags = legacy.tags.len(), "exported legacy numeric-coded document");
        }
        SchemaKind::Canonical => {
            let legacy = storage::load_legacy_tags(input).with_context(|| {
                format!("failed to load legacy tag map from {}", input.display())
            })?;
            let config = legacy
                .to_canonical()
                .context("legacy document contains codes with no canonical counterpart")?;
            storage::save_tags(out, &config)
                .with_context(|| format!("failed to write {}", out.display()))?;
            info!(tags = config.tags.len(), "imported legacy numeric-coded document");
        }
    }
    Ok(())
}
