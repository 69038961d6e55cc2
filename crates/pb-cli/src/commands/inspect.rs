use anyhow::Result;
use clap::Args;
use pb_core::{ComponentId, Document, query};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Project file (JSON)
    pub input: PathBuf,

    /// Print page summaries only
    #[arg(short, long)]
    pub summary: bool,
}

pub fn inspect(args: InspectArgs) -> Result<()> {
    let project = super::load_project(&args.input)?;
    println!(
        "{} ({} page(s), {} component(s))",
        project.name,
        project.pages.len(),
        project.component_count()
    );

    for page in &project.pages {
        let doc = &page.document;
        println!(
            "\n{} {} [{}] {} component(s), depth {}",
            page.path,
            page.name,
            page.id,
            doc.len(),
            query::tree_depth(doc)
        );
        if args.summary {
            continue;
        }
        for root in doc.root_ids() {
            print_tree(doc, *root, 1);
        }
    }
    Ok(())
}

fn print_tree(doc: &Document, id: ComponentId, depth: usize) {
    let Some(component) = doc.get(id) else {
        return;
    };
    let mut flags = String::new();
    if component.hidden {
        flags.push_str(" hidden");
    }
    if component.locked {
        flags.push_str(" locked");
    }
    println!(
        "{:indent$}{} <{}> #{}{flags}",
        "",
        component.name,
        component.kind,
        component.id,
        indent = depth * 2
    );
    for child in &component.child_ids {
        print_tree(doc, *child, depth + 1);
    }
}
