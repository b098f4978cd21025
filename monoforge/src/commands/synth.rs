use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use monoforge_core::lifecycle::PHASES;
use monoforge_core::Phase;

use crate::formatting::{
    create_phase_bar, format_duration, print_section_header, print_success, print_summary_box,
    SectionStyle,
};

use super::load_monorepo;

pub fn cmd_synth(root: PathBuf, quiet: bool) -> Result<()> {
    let start = Instant::now();
    let mut monorepo = load_monorepo(&root)?;

    print_section_header("Synthesizing workspace", SectionStyle::Primary);

    let pb = create_phase_bar(PHASES.len() as u64, quiet);
    for phase in PHASES {
        pb.set_message(phase.to_string());
        let result = match phase {
            Phase::PreSynthesize => monorepo.pre_synthesize(),
            Phase::Synthesize => monorepo.synthesize(),
            Phase::PostSynthesize => monorepo.post_synthesize(),
        };
        if let Err(err) = result {
            pb.abandon_with_message(format!("{} failed", phase));
            return Err(err.into());
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    for pin in monorepo.synced_pins() {
        print_success(&format!(
            "{}: {} → {}",
            pin.project, pin.previous, pin.version
        ));
    }

    let graph = monorepo.graph();
    let duration = format_duration(start.elapsed().as_secs_f64());
    print_summary_box(
        "Synthesis",
        &[
            ("Projects", &graph.subprojects().count().to_string()),
            ("Dependencies", &graph.edges().len().to_string()),
            ("Pins synced", &monorepo.synced_pins().len().to_string()),
            ("Duration", &duration),
        ],
    );
    println!();

    Ok(())
}
