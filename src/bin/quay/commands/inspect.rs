//! `quay inspect` command

use anyhow::Result;

use crate::cli::InspectArgs;
use quay::recipes;
use quay::util::shell::Shell;

pub fn execute(args: InspectArgs, shell: &Shell) -> Result<()> {
    let (recipe, source_data) = recipes::builtin(&args.recipe)?;
    let meta = &recipe.metadata;

    if shell.is_json() {
        let options: Vec<serde_json::Value> = recipe
            .options
            .iter()
            .map(|decl| {
                serde_json::json!({
                    "name": decl.name,
                    "values": decl.legal.iter().map(|v| v.to_string()).collect::<Vec<_>>(),
                    "default": decl.default.to_string(),
                    "platforms": decl.applies.to_string(),
                    "help": decl.help,
                })
            })
            .collect();
        let info = serde_json::json!({
            "reason": "recipe-info",
            "metadata": meta,
            "versions": source_data.versions(),
            "options": options,
        });
        shell.json_line(&info.to_string());
        return Ok(());
    }

    println!("{} {}", meta.name, meta.version);
    println!("{}", meta.description);
    println!();
    println!("license:  {}", meta.license);
    println!("homepage: {}", meta.homepage);
    println!("recipe:   {}", meta.url);
    println!("topics:   {}", meta.topics.join(", "));
    println!("versions: {}", source_data.versions().join(", "));
    println!();
    println!("options:");
    for decl in &recipe.options {
        let values: Vec<String> = decl.legal.iter().map(|v| v.to_string()).collect();
        println!(
            "  {:<24} [{}] default {} ({})",
            decl.name,
            values.join(", "),
            decl.default,
            decl.applies
        );
        if !decl.help.is_empty() {
            println!("  {:<24} {}", "", decl.help);
        }
    }

    Ok(())
}
