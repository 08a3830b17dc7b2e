use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::{CommonArgs, GroupArgs, ResetAllArgs};
use crate::model::{ChecklistDefinition, ChecklistState};
use crate::scoring::summarize;
use crate::store::StateStore;

use super::status::{write_group_states, write_summary};

pub fn run_reset_group(args: GroupArgs) -> Result<()> {
    let definition = ChecklistDefinition::load(&args.common.definition)?;
    let store = StateStore::new(&args.common.state_root);
    let mut state = store.load_validated(&definition);

    let group = definition
        .find_group(&args.group)
        .with_context(|| format!("unknown group id: {}", args.group))?;

    state.reset_group(&group);
    store.persist(&state);
    info!(group = %args.group, "group reset");

    render(&definition, &state)
}

pub fn run_commit_group(args: GroupArgs) -> Result<()> {
    let definition = ChecklistDefinition::load(&args.common.definition)?;
    let store = StateStore::new(&args.common.state_root);
    let mut state = store.load_validated(&definition);

    definition
        .find_group(&args.group)
        .with_context(|| format!("unknown group id: {}", args.group))?;

    state.commit_group(&args.group);
    store.persist(&state);
    info!(group = %args.group, "group committed");

    render(&definition, &state)
}

pub fn run_reset_all(args: ResetAllArgs) -> Result<()> {
    let definition = ChecklistDefinition::load(&args.common.definition)?;
    let store = StateStore::new(&args.common.state_root);
    let mut state = store.load_validated(&definition);

    if !args.yes && !confirm_reset()? {
        info!("reset-all aborted");
        return Ok(());
    }

    state.reset_all();
    store.clear();
    info!(slot = %store.path().display(), "all scores and commit flags cleared");

    render(&definition, &state)
}

pub fn run_commit_all(args: CommonArgs) -> Result<()> {
    let definition = ChecklistDefinition::load(&args.definition)?;
    let store = StateStore::new(&args.state_root);
    let mut state = store.load_validated(&definition);

    state.commit_all(&definition);
    store.persist(&state);
    info!(
        groups = state.committed_groups.len(),
        "all groups committed"
    );

    render(&definition, &state)
}

fn confirm_reset() -> Result<bool> {
    eprint!("Reset all sections? This will clear all scores and committed states. [y/N] ");
    io::stderr()
        .flush()
        .context("failed to flush confirmation prompt")?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read confirmation")?;

    let answer = line.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

fn render(definition: &ChecklistDefinition, state: &ChecklistState) -> Result<()> {
    let summary = summarize(definition, state);
    let mut output = io::BufWriter::new(io::stdout().lock());
    write_summary(&mut output, &summary)?;
    writeln!(output)?;
    write_group_states(&mut output, definition, state)?;
    output.flush()?;
    Ok(())
}
