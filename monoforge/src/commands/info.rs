use std::path::PathBuf;

use anyhow::Result;
use monoforge_core::run_many::delegated_command;
use monoforge_core::runner_config::{render_task_command, TasksManifest};

use crate::formatting::{print_key_value, print_section_header, print_task_table, SectionStyle};

use super::load_monorepo;

pub fn cmd_tasks(root: PathBuf, project: Option<String>, json: bool) -> Result<()> {
    let monorepo = load_monorepo(&root)?;
    let graph = monorepo.graph();
    let project = match project {
        Some(name) => graph.get(graph.resolve(&name)?)?,
        None => graph.root(),
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&TasksManifest::from(project))?
        );
        return Ok(());
    }

    print_section_header("Tasks", SectionStyle::Primary);
    print_key_value("Project", &project.name);
    print_key_value("Language", project.language.as_str());
    println!();

    let rows: Vec<_> = project
        .tasks()
        .map(|task| {
            let command = if task.is_captured() {
                delegated_command(task).map(str::to_string)
            } else {
                render_task_command(project, &task.name)
            };
            (
                task.name.clone(),
                task.description.clone().unwrap_or_default(),
                command.unwrap_or_default(),
                task.is_captured(),
            )
        })
        .collect();
    print_task_table(&rows);
    println!();

    Ok(())
}
