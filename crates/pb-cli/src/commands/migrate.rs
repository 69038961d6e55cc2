use anyhow::{Context, Result};
use clap::Args;
use pb_project::MigrationRegistry;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Project file (JSON)
    pub input: PathBuf,

    /// Where to write the upgraded file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn migrate(args: MigrateArgs) -> Result<()> {
    let value = super::read_json(&args.input)?;
    let migrated = MigrationRegistry::default()
        .migrate(value)
        .with_context(|| format!("migrating {}", args.input.display()))?;

    for (from, to) in &migrated.steps {
        log::info!("applied migration {from} -> {to}");
    }
    if migrated.steps.is_empty() {
        eprintln!("{} is already at version {}", args.input.display(), migrated.from);
    }

    let text = serde_json::to_string_pretty(&migrated.value)?;
    match args.output {
        Some(path) => std::fs::write(&path, text)
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{text}"),
    }
    Ok(())
}
