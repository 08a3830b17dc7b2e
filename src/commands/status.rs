use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::StatusArgs;
use crate::model::{ChecklistDefinition, ChecklistState, Summary};
use crate::scoring::summarize;
use crate::store::StateStore;

pub fn run(args: StatusArgs) -> Result<()> {
    let definition = ChecklistDefinition::load(&args.common.definition)?;
    let store = StateStore::new(&args.common.state_root);
    let state = store.load_validated(&definition);

    info!(
        definition = %args.common.definition.display(),
        slot = %store.path().display(),
        "status requested"
    );

    let summary = summarize(&definition, &state);
    let mut output = io::BufWriter::new(io::stdout().lock());

    if args.json {
        serde_json::to_writer_pretty(&mut output, &summary)
            .context("failed to serialize status json output")?;
        writeln!(output)?;
        output.flush()?;
        return Ok(());
    }

    write_summary(&mut output, &summary)?;
    writeln!(output)?;
    write_group_states(&mut output, &definition, &state)?;
    output.flush()?;

    Ok(())
}

/// The shared render step: every mutating command ends by printing this.
pub fn write_summary(output: &mut impl Write, summary: &Summary) -> io::Result<()> {
    writeln!(
        output,
        "Structural:  items={} score={}/{} ({:.1}%) band=\"{}\"",
        summary.structural.item_count,
        summary.structural.score_sum,
        summary.structural.max_score,
        summary.structural.percent,
        summary.structural.band,
    )?;
    writeln!(
        output,
        "Macro-topic: items={} score={}/{} ({:.1}%) band=\"{}\"",
        summary.macro_topic.item_count,
        summary.macro_topic.score_sum,
        summary.macro_topic.max_score,
        summary.macro_topic.percent,
        summary.macro_topic.band,
    )?;
    writeln!(
        output,
        "Combined:    score={}/{} ({:.1}%)",
        summary.combined_sum, summary.combined_max, summary.combined_percent,
    )
}

pub fn write_group_states(
    output: &mut impl Write,
    definition: &ChecklistDefinition,
    state: &ChecklistState,
) -> io::Result<()> {
    writeln!(output, "Groups:")?;

    let width = definition
        .groups()
        .map(|group| group.id.len())
        .max()
        .unwrap_or(0);

    for group in definition.groups() {
        let status = if state.is_committed(&group.id) {
            "committed"
        } else {
            "in progress"
        };
        writeln!(
            output,
            "  {:width$}  {}  ({status})",
            group.id, group.group.label
        )?;
    }

    Ok(())
}
