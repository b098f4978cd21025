//! Terminal output helpers shared by the commands.

mod headers;
mod output;
mod progress;
mod status;
mod tables;

pub use headers::{print_section_header, SectionStyle};
pub use output::{format_duration, print_key_value, print_summary_box};
pub use progress::create_phase_bar;
pub use status::{print_error, print_success, print_warning};
pub use tables::{print_edge_table, print_project_table, print_task_table};
