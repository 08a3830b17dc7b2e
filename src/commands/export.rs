use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::{ExportArgs, ExportFormat};
use crate::model::{ChecklistDefinition, ChecklistState, Group, Item, Section, Summary};
use crate::scoring::summarize;
use crate::store::StateStore;
use crate::util::{ensure_directory, now_utc_string};

struct ExportRow<'a> {
    section: &'a Section,
    group: &'a Group,
    group_id: String,
    item: &'a Item,
    score: Option<u32>,
}

pub fn run(args: ExportArgs) -> Result<()> {
    // The definition must load before anything is written; a failure here
    // aborts the export with no partial output.
    let definition = ChecklistDefinition::load(&args.common.definition)?;
    let store = StateStore::new(&args.common.state_root);
    let state = store.load_validated(&definition);

    let summary = summarize(&definition, &state);
    let rows = collect_rows(&definition, &state);

    let mut buffer = Vec::new();
    match args.format {
        ExportFormat::Csv => write_csv(&mut buffer, &summary, &rows)?,
        ExportFormat::Report => write_report(&mut buffer, &summary, &rows, &now_utc_string())?,
    }

    match &args.out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                ensure_directory(parent)?;
            }
            fs::write(path, &buffer)
                .with_context(|| format!("failed to write export: {}", path.display()))?;
            info!(
                path = %path.display(),
                format = args.format.as_str(),
                rows = rows.len(),
                "wrote export"
            );
        }
        None => {
            let mut output = io::BufWriter::new(io::stdout().lock());
            output.write_all(&buffer)?;
            output.flush()?;
        }
    }

    Ok(())
}

fn collect_rows<'a>(
    definition: &'a ChecklistDefinition,
    state: &ChecklistState,
) -> Vec<ExportRow<'a>> {
    definition
        .items()
        .map(|entry| ExportRow {
            section: entry.section,
            group: entry.group,
            group_id: entry.group_id,
            score: state.score(&entry.item.id),
            item: entry.item,
        })
        .collect()
}

/// Summary block, blank line, header row, one row per item. Score is blank
/// for unrated items, which is not the same thing as 0.
fn write_csv(output: &mut impl Write, summary: &Summary, rows: &[ExportRow<'_>]) -> io::Result<()> {
    writeln!(output, "Total,Score,Max")?;
    writeln!(
        output,
        "Structural,{},{}",
        summary.structural.score_sum, summary.structural.max_score
    )?;
    writeln!(
        output,
        "Macro-topic,{},{}",
        summary.macro_topic.score_sum, summary.macro_topic.max_score
    )?;
    writeln!(
        output,
        "Combined,{},{}",
        summary.combined_sum, summary.combined_max
    )?;
    writeln!(output)?;

    writeln!(
        output,
        "Section ID,Section,Group ID,Group,Item ID,Item,Score"
    )?;
    for row in rows {
        let score = row.score.map(|value| value.to_string()).unwrap_or_default();
        let fields = [
            csv_field(&row.section.id),
            csv_field(&row.section.label),
            csv_field(&row.group_id),
            csv_field(&row.group.label),
            csv_field(&row.item.id),
            csv_field(&row.item.label),
            score,
        ];
        writeln!(output, "{}", fields.join(","))?;
    }

    Ok(())
}

/// Quote a field only when it contains a comma, quote, or newline; internal
/// quotes are doubled.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// The same row set as a titled, column-aligned text table with a one-line
/// summary of the three totals.
fn write_report(
    output: &mut impl Write,
    summary: &Summary,
    rows: &[ExportRow<'_>],
    generated_at: &str,
) -> io::Result<()> {
    writeln!(output, "Clarity Checklist Report")?;
    writeln!(output, "Generated: {generated_at}")?;
    writeln!(
        output,
        "Totals: structural {}/{} (\"{}\"), macro-topic {}/{} (\"{}\"), combined {}/{} ({:.1}%)",
        summary.structural.score_sum,
        summary.structural.max_score,
        summary.structural.band,
        summary.macro_topic.score_sum,
        summary.macro_topic.max_score,
        summary.macro_topic.band,
        summary.combined_sum,
        summary.combined_max,
        summary.combined_percent,
    )?;
    writeln!(output)?;

    let header = ["Section", "Group", "Item", "Label", "Score"];
    let mut widths = [
        header[0].len(),
        header[1].len(),
        header[2].len(),
        header[3].len(),
    ];
    for row in rows {
        widths[0] = widths[0].max(row.section.label.len());
        widths[1] = widths[1].max(row.group_id.len());
        widths[2] = widths[2].max(row.item.id.len());
        widths[3] = widths[3].max(row.item.label.len());
    }

    writeln!(
        output,
        "{:w0$}  {:w1$}  {:w2$}  {:w3$}  {}",
        header[0],
        header[1],
        header[2],
        header[3],
        header[4],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
        w3 = widths[3],
    )?;

    for row in rows {
        let score = row
            .score
            .map(|value| value.to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            output,
            "{:w0$}  {:w1$}  {:w2$}  {:w3$}  {}",
            row.section.label,
            row.group_id,
            row.item.id,
            row.item.label,
            score,
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
            w3 = widths[3],
        )?;
    }

    Ok(())
}
