use anyhow::Result;
use clap::Args;
use pb_project::{Severity, has_errors};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Project file (JSON)
    pub input: PathBuf,

    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

pub fn validate(args: ValidateArgs) -> Result<()> {
    let value = super::read_json(&args.input)?;
    let findings = pb_project::validate(&value);

    for finding in &findings {
        println!("{finding}");
    }
    let warnings = findings.iter().filter(|f| f.severity == Severity::Warning).count();
    let errors = findings.len() - warnings;
    println!("{}: {errors} error(s), {warnings} warning(s)", args.input.display());

    if has_errors(&findings) || (args.strict && warnings > 0) {
        anyhow::bail!("validation failed");
    }
    Ok(())
}
