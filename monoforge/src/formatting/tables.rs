//! Table formatting using comfy-table.

use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use owo_colors::OwoColorize;

fn table_with_header(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(*h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        )
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Projects as `(name, language, outdir)`.
pub fn print_project_table(projects: &[(String, String, String)]) {
    let mut table = table_with_header(&["Project", "Language", "Directory"]);
    for (name, language, outdir) in projects {
        table.add_row(vec![
            Cell::new(name).fg(Color::White),
            Cell::new(language).fg(Color::DarkGrey),
            Cell::new(outdir).fg(Color::DarkGrey),
        ]);
    }
    println!("{}", table);
}

/// Edges as `(dependent, dependee, kind)`.
pub fn print_edge_table(edges: &[(String, String, String)]) {
    let mut table = table_with_header(&["Dependent", "Dependee", "Kind"]);
    for (dependent, dependee, kind) in edges {
        table.add_row(vec![
            Cell::new(dependent).fg(Color::White),
            Cell::new(dependee).fg(Color::White),
            Cell::new(kind).fg(Color::Cyan),
        ]);
    }
    println!("{}", table);
}

/// Tasks as `(name, description, command, captured)`; captured tasks are highlighted.
pub fn print_task_table(tasks: &[(String, String, String, bool)]) {
    let mut table = table_with_header(&["Task", "Description", "Runs"]);
    for (name, description, command, captured) in tasks {
        let command = if command.is_empty() {
            "(no steps)".bright_black().to_string()
        } else {
            command.clone()
        };
        let name_cell = if *captured {
            Cell::new(name).fg(Color::Cyan)
        } else {
            Cell::new(name).fg(Color::White)
        };
        table.add_row(vec![
            name_cell,
            Cell::new(description).fg(Color::DarkGrey),
            Cell::new(command),
        ]);
    }
    println!("{}", table);
}
