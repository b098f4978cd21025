use std::path::PathBuf;

use anyhow::Result;
use monoforge_core::EdgeKind;

use crate::formatting::{
    print_edge_table, print_key_value, print_project_table, print_section_header, print_warning,
    SectionStyle,
};

use super::load_monorepo;

fn kind_label(kind: EdgeKind) -> &'static str {
    match kind {
        EdgeKind::Implicit => "implicit",
        EdgeKind::SameEcosystemBuild => "same-ecosystem-build",
        EdgeKind::CrossEcosystemPackage => "cross-ecosystem-package",
    }
}

pub fn cmd_graph(root: PathBuf, json: bool) -> Result<()> {
    let monorepo = load_monorepo(&root)?;
    let graph = monorepo.graph();
    let order = graph.topological_order()?;

    let name_of = |id| graph.get(id).map(|p| p.name.clone());
    let names = order
        .iter()
        .map(|id| name_of(*id))
        .collect::<monoforge_core::Result<Vec<_>>>()?;
    let edges = graph
        .edges()
        .iter()
        .map(|edge| -> monoforge_core::Result<_> {
            Ok((
                name_of(edge.dependent)?,
                name_of(edge.dependee)?,
                kind_label(edge.kind).to_string(),
            ))
        })
        .collect::<monoforge_core::Result<Vec<_>>>()?;

    if json {
        let edges: Vec<_> = edges
            .iter()
            .map(|(dependent, dependee, kind)| {
                serde_json::json!({
                    "dependent": dependent,
                    "dependee": dependee,
                    "kind": kind,
                })
            })
            .collect();
        let data = serde_json::json!({
            "order": names,
            "edges": edges,
        });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    print_section_header("Workspace Graph", SectionStyle::Primary);
    if graph.subprojects().next().is_none() {
        print_warning("No projects defined");
        println!();
        return Ok(());
    }

    print_key_value("Build order", &names.join(" → "));
    println!();

    let projects: Vec<_> = order
        .iter()
        .filter_map(|id| graph.get(*id).ok())
        .map(|p| {
            (
                p.name.clone(),
                p.language.as_str().to_string(),
                p.outdir.display().to_string(),
            )
        })
        .collect();
    print_project_table(&projects);
    println!();

    if edges.is_empty() {
        print_warning("No dependencies declared");
    } else {
        print_edge_table(&edges);
    }
    println!();

    Ok(())
}
