use std::io::{self, Write};

use anyhow::Result;
use tracing::info;

use crate::cli::ListArgs;
use crate::model::{ChecklistDefinition, ChecklistState, qualified_group_id};
use crate::store::StateStore;

/// Read-only dump of the full hierarchy with scales, current ratings, and
/// commit states. Mutates nothing and never persists.
pub fn run(args: ListArgs) -> Result<()> {
    let definition = ChecklistDefinition::load(&args.common.definition)?;
    let store = StateStore::new(&args.common.state_root);
    let state = store.load_validated(&definition);

    info!(
        sections = definition.sections.len(),
        definition = %args.common.definition.display(),
        "listing checklist"
    );

    let mut output = io::BufWriter::new(io::stdout().lock());
    write_hierarchy(&mut output, &definition, &state)?;
    output.flush()?;

    Ok(())
}

fn write_hierarchy(
    output: &mut impl Write,
    definition: &ChecklistDefinition,
    state: &ChecklistState,
) -> io::Result<()> {
    for section in &definition.sections {
        writeln!(
            output,
            "{} [{}] {} (max score: {})",
            section.id,
            section.kind().as_str(),
            section.label,
            section.max_score
        )?;

        for group in &section.groups {
            let group_id = qualified_group_id(&section.id, &group.code);
            let status = if state.is_committed(&group_id) {
                "committed"
            } else {
                "in progress"
            };
            writeln!(output, "  {group_id}  {}  ({status})", group.label)?;

            for item in &group.items {
                let scale = item
                    .scale
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("/");
                let rating = match state.score(&item.id) {
                    Some(value) => format!("score={value}"),
                    None => "unrated".to_string(),
                };
                writeln!(
                    output,
                    "    {}  {}  [scale {scale}]  {rating}",
                    item.id, item.label
                )?;
                if let Some(description) = &item.description {
                    writeln!(output, "      {description}")?;
                }
            }
        }
    }

    Ok(())
}
