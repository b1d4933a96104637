//! Show command - display a summary of the composed package

use console::style;
use skiff_core::Component;

use crate::LoadArgs;
use crate::error::Result;

pub async fn run(args: &LoadArgs) -> Result<()> {
    let (loaded, _scratch) = super::load(args).await?;
    let pkg = &loaded.package;
    let meta = &pkg.metadata;

    println!("{}", style(&meta.name).cyan().bold());
    println!("{}", style("=".repeat(meta.name.len())).dim());
    println!();

    if !meta.version.is_empty() {
        println!("{}: {}", style("Version").bold(), meta.version);
    }
    if !meta.description.is_empty() {
        println!("{}: {}", style("Description").bold(), meta.description);
    }
    println!("{}: {:?}", style("Kind").bold(), pkg.kind);
    println!("{}: {}", style("Architecture").bold(), meta.architecture);
    if !args.flavor.is_empty() {
        println!("{}: {}", style("Flavor").bold(), args.flavor);
    }

    println!();
    println!("{}:", style("Components").bold());
    for component in &pkg.components {
        print_component(component);
    }

    if !pkg.variables.is_empty() {
        println!();
        println!("{}:", style("Variables").bold());
        for variable in &pkg.variables {
            if variable.default.is_empty() {
                println!("  - {}", variable.variable.name);
            } else {
                println!("  - {} (default: {})", variable.variable.name, variable.default);
            }
        }
    }

    if !pkg.constants.is_empty() {
        println!();
        println!("{}:", style("Constants").bold());
        for constant in &pkg.constants {
            println!("  - {} = {}", constant.name, constant.value);
        }
    }

    if !pkg.values.files.is_empty() {
        println!();
        println!("{}:", style("Values files").bold());
        for file in &pkg.values.files {
            println!("  - {}", file);
        }
    }

    Ok(())
}

fn print_component(component: &Component) {
    let mut flags = Vec::new();
    if component.is_required() {
        flags.push("required");
    }
    if component.default {
        flags.push("default");
    }
    if component.requires_cluster() {
        flags.push("cluster");
    }

    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" {}", style(format!("[{}]", flags.join(", "))).yellow())
    };
    println!("  {} {}{}", style("•").green(), style(&component.name).bold(), flags);

    if !component.description.is_empty() {
        println!("    {}", style(&component.description).dim());
    }

    let counts = [
        ("charts", component.charts.len()),
        ("manifests", component.manifests.len()),
        ("images", component.images.len()),
        ("repos", component.repos.len()),
        ("files", component.files.len()),
        ("data injections", component.data_injections.len()),
        ("image archives", component.image_archives.len()),
    ];
    let summary: Vec<String> = counts
        .iter()
        .filter(|(_, n)| *n > 0)
        .map(|(label, n)| format!("{} {}", n, label))
        .collect();
    if !summary.is_empty() {
        println!("    {}", summary.join(", "));
    }
}
