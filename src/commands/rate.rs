use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::RateArgs;
use crate::commands::status::write_summary;
use crate::model::ChecklistDefinition;
use crate::scoring::summarize;
use crate::store::StateStore;

pub fn run(args: RateArgs) -> Result<()> {
    let definition = ChecklistDefinition::load(&args.common.definition)?;
    let store = StateStore::new(&args.common.state_root);
    let mut state = store.load_validated(&definition);

    let entry = definition
        .find_item(&args.item)
        .with_context(|| format!("unknown item id: {}", args.item))?;

    if args.clear {
        let removed = state.clear_rating(&args.item);
        info!(item = %args.item, removed, "rating cleared");
    } else {
        let score = args
            .score
            .context("either --score or --clear is required")?;

        if !entry.item.scale.contains(&score) {
            let allowed = entry
                .item
                .scale
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            bail!(
                "score {score} is not on the scale for item {} (allowed: {allowed})",
                args.item
            );
        }

        state.rate(&args.item, score);
        info!(item = %args.item, score, group = %entry.group_id, "rating recorded");
    }

    store.persist(&state);

    let summary = summarize(&definition, &state);
    let mut output = io::BufWriter::new(io::stdout().lock());
    write_summary(&mut output, &summary)?;
    output.flush()?;

    Ok(())
}
