use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use pb_project::{ConflictStrategy, ImportMode, ImportOptions, storage};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Project to merge into
    pub base: PathBuf,

    /// Project whose pages are imported
    pub incoming: PathBuf,

    #[arg(long, value_enum, default_value_t = Mode::Merge)]
    pub mode: Mode,

    /// How to resolve pages whose path already exists
    #[arg(long, value_enum, default_value_t = Conflicts::Rename)]
    pub conflicts: Conflicts,

    /// Keep incoming ids instead of generating fresh ones
    #[arg(long)]
    pub preserve_ids: bool,

    /// Page ids or paths to take in selective mode
    #[arg(long = "page")]
    pub pages: Vec<String>,

    /// Where to write the result (overwrites BASE when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Mode {
    Merge,
    Replace,
    Selective,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Conflicts {
    Skip,
    Rename,
    Replace,
}

impl From<Mode> for ImportMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Merge => ImportMode::Merge,
            Mode::Replace => ImportMode::Replace,
            Mode::Selective => ImportMode::Selective,
        }
    }
}

impl From<Conflicts> for ConflictStrategy {
    fn from(conflicts: Conflicts) -> Self {
        match conflicts {
            Conflicts::Skip => ConflictStrategy::Skip,
            Conflicts::Rename => ConflictStrategy::Rename,
            Conflicts::Replace => ConflictStrategy::Replace,
        }
    }
}

pub fn merge(args: MergeArgs) -> Result<()> {
    let mut project = super::load_project(&args.base)?;
    let incoming = super::read_json(&args.incoming)?;

    let options = ImportOptions {
        mode: args.mode.into(),
        handle_conflicts: args.conflicts.into(),
        preserve_ids: args.preserve_ids,
        selected_pages: args.pages,
    };
    let result = pb_project::import(incoming, &project.pages, &options);
    if !result.success {
        anyhow::bail!("import failed:\n  {}", result.errors.join("\n  "));
    }

    for warning in &result.warnings {
        eprintln!("{warning}");
    }
    for conflict in &result.conflicts {
        eprintln!("conflict on {}: {:?}", conflict.path, conflict.resolution);
    }
    let components = result.imported_components;
    let skipped = result.skipped.len();
    let pages = project.apply_import(result);
    println!("imported {pages} page(s), {components} component(s), skipped {skipped}");

    let out = args.output.unwrap_or(args.base);
    let exported = pb_project::export(&project, None);
    storage::write_project_file(&out, &exported)
        .with_context(|| format!("writing {}", out.display()))?;
    Ok(())
}
