use crate::model::{ChecklistDefinition, ChecklistState, KindSummary, SectionKind, Summary, Totals};

/// One completeness band: an inclusive minimum score and its label.
#[derive(Debug, Clone, Copy)]
pub struct Band {
    pub min: u32,
    pub label: &'static str,
}

pub const STRUCTURAL_MAX: u32 = 190;
pub const MACRO_MAX: u32 = 215;
pub const COMBINED_MAX: u32 = STRUCTURAL_MAX + MACRO_MAX;

/// Structural bands, highest minimum first. Cutoffs sit at 90/80/70/60/50/30
/// percent of the structural maximum.
pub const STRUCTURAL_BANDS: [Band; 7] = [
    Band { min: 171, label: "Excellent Completeness" },
    Band { min: 152, label: "High Completeness" },
    Band { min: 133, label: "Good Completeness" },
    Band { min: 114, label: "Moderate Completeness" },
    Band { min: 95, label: "Fair Completeness" },
    Band { min: 57, label: "Low Completeness" },
    Band { min: 0, label: "Incomplete" },
];

/// Macro-topic bands, independently configured over a different maximum.
/// Same percentage anchors as the structural table, rounded up.
pub const MACRO_BANDS: [Band; 7] = [
    Band { min: 194, label: "Excellent Completeness" },
    Band { min: 172, label: "High Completeness" },
    Band { min: 151, label: "Good Completeness" },
    Band { min: 129, label: "Moderate Completeness" },
    Band { min: 108, label: "Fair Completeness" },
    Band { min: 65, label: "Low Completeness" },
    Band { min: 0, label: "Incomplete" },
];

/// A classified score. `index` counts up from the lowest band (Incomplete is
/// 0), so band ordering comparisons read in the same direction as scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandRating {
    pub label: &'static str,
    pub index: usize,
}

/// First band whose inclusive minimum is at or below the score, scanning
/// from the highest minimum down. A score sitting exactly on a boundary
/// lands in the higher band; if nothing matches, the lowest band applies.
pub fn classify(score: u32, bands: &[Band]) -> BandRating {
    for (position, band) in bands.iter().enumerate() {
        if score >= band.min {
            return BandRating {
                label: band.label,
                index: bands.len() - 1 - position,
            };
        }
    }

    BandRating {
        label: bands.last().map_or("Incomplete", |band| band.label),
        index: 0,
    }
}

/// Progress percentage, clamped so an over-rated total never overflows the
/// bar.
pub fn percent(score: u32, max: u32) -> f64 {
    if max == 0 {
        return 0.0;
    }
    (100.0 * f64::from(score) / f64::from(max)).clamp(0.0, 100.0)
}

/// Walk every item in the definition and accumulate per-kind counts and
/// sums. Every item counts toward its kind whether rated or not; absent
/// ratings contribute 0 to sums. Because the walk is over the definition,
/// score entries for unknown items never influence the result.
pub fn compute_totals(definition: &ChecklistDefinition, state: &ChecklistState) -> Totals {
    let mut totals = Totals::default();

    for entry in definition.items() {
        let value = state.score(&entry.item.id).unwrap_or(0);
        match entry.section.kind() {
            SectionKind::Structural => {
                totals.structural_count += 1;
                totals.structural_sum += value;
            }
            SectionKind::MacroTopic => {
                totals.macro_count += 1;
                totals.macro_sum += value;
            }
        }
    }

    totals
}

/// Build the render-ready summary. Pure over its inputs: calling it twice
/// with no intervening mutation yields identical output.
pub fn summarize(definition: &ChecklistDefinition, state: &ChecklistState) -> Summary {
    let totals = compute_totals(definition, state);

    let structural_band = classify(totals.structural_sum, &STRUCTURAL_BANDS);
    let macro_band = classify(totals.macro_sum, &MACRO_BANDS);
    let combined_sum = totals.structural_sum + totals.macro_sum;

    Summary {
        structural: KindSummary {
            kind: SectionKind::Structural,
            item_count: totals.structural_count,
            score_sum: totals.structural_sum,
            max_score: STRUCTURAL_MAX,
            band: structural_band.label.to_string(),
            band_index: structural_band.index,
            percent: percent(totals.structural_sum, STRUCTURAL_MAX),
        },
        macro_topic: KindSummary {
            kind: SectionKind::MacroTopic,
            item_count: totals.macro_count,
            score_sum: totals.macro_sum,
            max_score: MACRO_MAX,
            band: macro_band.label.to_string(),
            band_index: macro_band.index,
            percent: percent(totals.macro_sum, MACRO_MAX),
        },
        combined_sum,
        combined_max: COMBINED_MAX,
        combined_percent: percent(combined_sum, COMBINED_MAX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChecklistDefinition;

    fn two_kind_definition() -> ChecklistDefinition {
        serde_json::from_value(serde_json::json!({
            "sections": [
                {
                    "id": "S",
                    "label": "Structural",
                    "maxScore": 10,
                    "groups": [{
                        "code": "TI",
                        "label": "Title",
                        "items": [
                            { "id": "STI01", "label": "a", "scale": [0, 1, 2, 3, 4, 5] },
                            { "id": "STI02", "label": "b", "scale": [0, 1, 2, 3, 4, 5] }
                        ]
                    }]
                },
                {
                    "id": "M1",
                    "label": "Macro",
                    "maxScore": 10,
                    "groups": [{
                        "code": "CL",
                        "label": "Clarity",
                        "items": [
                            { "id": "M1CL01", "label": "c", "scale": [0, 1, 2, 3, 4, 5] },
                            { "id": "M1CL02", "label": "d", "scale": [0, 1, 2, 3, 4, 5] }
                        ]
                    }]
                }
            ]
        }))
        .expect("definition should deserialize")
    }

    #[test]
    fn totals_split_by_section_kind_and_count_unrated_items() {
        let definition = two_kind_definition();
        let mut state = ChecklistState::default();
        state.rate("STI01", 3);
        state.rate("M1CL02", 5);

        let totals = compute_totals(&definition, &state);
        assert_eq!(totals.structural_count, 2, "count reflects definition shape");
        assert_eq!(totals.structural_sum, 3);
        assert_eq!(totals.macro_count, 2);
        assert_eq!(totals.macro_sum, 5);
    }

    #[test]
    fn totals_with_zero_rated_items_still_reflect_definition_shape() {
        let definition = two_kind_definition();
        let totals = compute_totals(&definition, &ChecklistState::default());

        assert_eq!(totals.structural_count, 2);
        assert_eq!(totals.macro_count, 2);
        assert_eq!(totals.structural_sum, 0);
        assert_eq!(totals.macro_sum, 0);
    }

    #[test]
    fn ghost_score_entries_do_not_influence_totals() {
        let definition = two_kind_definition();
        let mut state = ChecklistState::default();
        state.rate("STI01", 3);
        state.rate("ghost-item", 5);

        let totals = compute_totals(&definition, &state);
        assert_eq!(totals.structural_sum, 3);
        assert_eq!(totals.macro_sum, 0);
        assert_eq!(totals.structural_count + totals.macro_count, 4);
    }

    #[test]
    fn structural_boundary_at_171_is_inclusive() {
        let upper = classify(171, &STRUCTURAL_BANDS);
        assert_eq!(upper.label, "Excellent Completeness");

        let lower = classify(170, &STRUCTURAL_BANDS);
        assert_eq!(lower.label, "High Completeness");
        assert_eq!(lower.index + 1, upper.index);
    }

    #[test]
    fn classify_falls_back_to_the_lowest_band() {
        let rating = classify(0, &STRUCTURAL_BANDS);
        assert_eq!(rating.label, "Incomplete");
        assert_eq!(rating.index, 0);

        let macro_rating = classify(64, &MACRO_BANDS);
        assert_eq!(macro_rating.label, "Incomplete");
    }

    #[test]
    fn classify_is_monotonic_over_both_tables() {
        for bands in [&STRUCTURAL_BANDS, &MACRO_BANDS] {
            let mut previous = classify(0, bands).index;
            for score in 1..=250 {
                let current = classify(score, bands).index;
                assert!(
                    current >= previous,
                    "band index regressed at score {score}: {previous} -> {current}"
                );
                previous = current;
            }
        }
    }

    #[test]
    fn percent_clamps_over_rated_totals() {
        assert_eq!(percent(500, STRUCTURAL_MAX), 100.0);
        assert_eq!(percent(0, STRUCTURAL_MAX), 0.0);
        assert_eq!(percent(95, STRUCTURAL_MAX), 50.0);
        assert_eq!(percent(1, 0), 0.0);
    }

    #[test]
    fn summarize_is_idempotent_and_combines_maxima_only() {
        let definition = two_kind_definition();
        let mut state = ChecklistState::default();
        state.rate("STI01", 4);
        state.rate("M1CL01", 2);

        let first = summarize(&definition, &state);
        let second = summarize(&definition, &state);
        assert_eq!(first, second, "no mutation means identical output");

        assert_eq!(first.combined_sum, 6);
        assert_eq!(first.combined_max, 405);
        assert_eq!(first.structural.max_score, 190);
        assert_eq!(first.macro_topic.max_score, 215);
    }
}
