use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Derived classification of a section, never stored in the definition:
/// a section id that starts with "M" (trimmed, case-insensitive) is a
/// macro-topic section, anything else is structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionKind {
    Structural,
    MacroTopic,
}

impl SectionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Structural => "structural",
            Self::MacroTopic => "macro-topic",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ordered set of allowed ratings, a subset of 0..=5.
    pub scale: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub code: String,
    pub label: String,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub label: String,
    pub max_score: u32,
    pub groups: Vec<Group>,
}

impl Section {
    pub fn kind(&self) -> SectionKind {
        if self.id.trim().to_ascii_uppercase().starts_with('M') {
            SectionKind::MacroTopic
        } else {
            SectionKind::Structural
        }
    }
}

/// A group's fully-qualified id, e.g. section "S" + code "TI" = "S-TI".
pub fn qualified_group_id(section_id: &str, code: &str) -> String {
    format!("{section_id}-{code}")
}

/// One item together with its enclosing section and group.
#[derive(Debug, Clone)]
pub struct ItemRef<'a> {
    pub section: &'a Section,
    pub group: &'a Group,
    pub group_id: String,
    pub item: &'a Item,
}

#[derive(Debug, Clone)]
pub struct GroupRef<'a> {
    pub section: &'a Section,
    pub group: &'a Group,
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistDefinition {
    pub sections: Vec<Section>,
}

impl ChecklistDefinition {
    /// Load and validate the definition document. Any failure here is fatal
    /// for the invoking command; the definition is read-only afterwards.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path)
            .with_context(|| format!("failed to read checklist definition: {}", path.display()))?;
        let definition: Self = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse checklist definition: {}", path.display()))?;
        definition
            .validate()
            .with_context(|| format!("invalid checklist definition: {}", path.display()))?;
        Ok(definition)
    }

    fn validate(&self) -> Result<()> {
        if self.sections.is_empty() {
            bail!("definition contains no sections");
        }

        let mut item_ids = BTreeSet::new();
        let mut group_ids = BTreeSet::new();

        for section in &self.sections {
            if section.id.trim().is_empty() {
                bail!("section with empty id (label: {:?})", section.label);
            }

            for group in &section.groups {
                let group_id = qualified_group_id(&section.id, &group.code);
                if !group_ids.insert(group_id.clone()) {
                    bail!("duplicate group id: {group_id}");
                }

                for item in &group.items {
                    if !item_ids.insert(item.id.clone()) {
                        bail!("duplicate item id: {}", item.id);
                    }
                    if item.scale.is_empty() {
                        bail!("item {} has an empty rating scale", item.id);
                    }
                    if let Some(value) = item.scale.iter().find(|value| **value > 5) {
                        bail!("item {} has out-of-range scale value {value}", item.id);
                    }
                }
            }
        }

        Ok(())
    }

    /// Every item in definition order, with its enclosing section and group.
    pub fn items(&self) -> impl Iterator<Item = ItemRef<'_>> {
        self.sections.iter().flat_map(|section| {
            section.groups.iter().flat_map(move |group| {
                group.items.iter().map(move |item| ItemRef {
                    section,
                    group,
                    group_id: qualified_group_id(&section.id, &group.code),
                    item,
                })
            })
        })
    }

    pub fn groups(&self) -> impl Iterator<Item = GroupRef<'_>> {
        self.sections.iter().flat_map(|section| {
            section.groups.iter().map(move |group| GroupRef {
                section,
                group,
                id: qualified_group_id(&section.id, &group.code),
            })
        })
    }

    pub fn find_item(&self, item_id: &str) -> Option<ItemRef<'_>> {
        self.items().find(|entry| entry.item.id == item_id)
    }

    pub fn find_group(&self, group_id: &str) -> Option<GroupRef<'_>> {
        self.groups().find(|entry| entry.id == group_id)
    }
}

/// The two dynamic maps layered over the static definition. Absence of a
/// score key means unrated, which contributes 0 to sums but is rendered
/// distinctly from an explicit 0. Serde names match the persisted slot
/// schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistState {
    #[serde(default)]
    pub scores: BTreeMap<String, u32>,
    #[serde(default, rename = "committedGroups")]
    pub committed_groups: BTreeMap<String, bool>,
}

impl ChecklistState {
    pub fn score(&self, item_id: &str) -> Option<u32> {
        self.scores.get(item_id).copied()
    }

    pub fn rate(&mut self, item_id: &str, score: u32) {
        self.scores.insert(item_id.to_string(), score);
    }

    /// Returns whether a rating was actually present.
    pub fn clear_rating(&mut self, item_id: &str) -> bool {
        self.scores.remove(item_id).is_some()
    }

    pub fn is_committed(&self, group_id: &str) -> bool {
        self.committed_groups.get(group_id).copied().unwrap_or(false)
    }

    /// Commit carries no precondition: a group with zero rated items is a
    /// legal committed state.
    pub fn commit_group(&mut self, group_id: &str) {
        self.committed_groups.insert(group_id.to_string(), true);
    }

    pub fn commit_all(&mut self, definition: &ChecklistDefinition) {
        for group in definition.groups() {
            self.committed_groups.insert(group.id, true);
        }
    }

    /// Resetting a group clears every rating belonging to it as well as its
    /// commit flag. Idempotent.
    pub fn reset_group(&mut self, group: &GroupRef<'_>) {
        for item in &group.group.items {
            self.scores.remove(&item.id);
        }
        self.committed_groups.remove(&group.id);
    }

    pub fn reset_all(&mut self) {
        self.scores.clear();
        self.committed_groups.clear();
    }
}

/// Raw per-kind counts and sums over the whole definition. Counts reflect
/// definition shape (every item counts, rated or not); sums add only the
/// ratings that are present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub structural_count: usize,
    pub structural_sum: u32,
    pub macro_count: usize,
    pub macro_sum: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KindSummary {
    pub kind: SectionKind,
    pub item_count: usize,
    pub score_sum: u32,
    pub max_score: u32,
    pub band: String,
    pub band_index: usize,
    pub percent: f64,
}

/// Render-ready aggregate: per-kind totals with completeness bands plus the
/// combined total, which carries a percentage only (no band of its own).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub structural: KindSummary,
    pub macro_topic: KindSummary,
    pub combined_sum: u32,
    pub combined_max: u32,
    pub combined_percent: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_definition() -> ChecklistDefinition {
        serde_json::from_value(serde_json::json!({
            "sections": [
                {
                    "id": "S",
                    "label": "Structural Quality",
                    "maxScore": 10,
                    "groups": [
                        {
                            "code": "TI",
                            "label": "Title",
                            "items": [
                                { "id": "STI01", "label": "Identification", "scale": [0, 1, 2, 3, 4, 5] },
                                { "id": "STI02", "label": "Scope", "description": "Scope statement", "scale": [0, 1, 2, 3, 4, 5] }
                            ]
                        }
                    ]
                },
                {
                    "id": "M1",
                    "label": "Macro Topic One",
                    "maxScore": 5,
                    "groups": [
                        {
                            "code": "CL",
                            "label": "Clarity",
                            "items": [
                                { "id": "M1CL01", "label": "Plain language", "scale": [0, 3, 5] }
                            ]
                        }
                    ]
                }
            ]
        }))
        .expect("sample definition should deserialize")
    }

    #[test]
    fn section_kind_follows_id_prefix_case_insensitively() {
        let definition = sample_definition();
        assert_eq!(definition.sections[0].kind(), SectionKind::Structural);
        assert_eq!(definition.sections[1].kind(), SectionKind::MacroTopic);

        let lowercase: Section = serde_json::from_value(serde_json::json!({
            "id": "  m2 ",
            "label": "whitespace and lowercase",
            "maxScore": 5,
            "groups": []
        }))
        .expect("section should deserialize");
        assert_eq!(lowercase.kind(), SectionKind::MacroTopic);
    }

    #[test]
    fn qualified_group_id_joins_section_and_code() {
        assert_eq!(qualified_group_id("S", "TI"), "S-TI");
        let definition = sample_definition();
        let group = definition
            .find_group("M1-CL")
            .expect("qualified lookup should find the macro group");
        assert_eq!(group.section.id, "M1");
        assert_eq!(group.group.label, "Clarity");
    }

    #[test]
    fn find_item_returns_enclosing_section_and_group() {
        let definition = sample_definition();
        let entry = definition
            .find_item("STI02")
            .expect("item lookup should succeed");
        assert_eq!(entry.section.id, "S");
        assert_eq!(entry.group_id, "S-TI");
        assert_eq!(entry.item.description.as_deref(), Some("Scope statement"));

        assert!(definition.find_item("ghost-item").is_none());
    }

    #[test]
    fn validate_rejects_duplicate_item_ids() {
        let definition: ChecklistDefinition = serde_json::from_value(serde_json::json!({
            "sections": [{
                "id": "S",
                "label": "Structural",
                "maxScore": 10,
                "groups": [{
                    "code": "TI",
                    "label": "Title",
                    "items": [
                        { "id": "STI01", "label": "a", "scale": [0, 5] },
                        { "id": "STI01", "label": "b", "scale": [0, 5] }
                    ]
                }]
            }]
        }))
        .expect("shape should deserialize");

        let error = definition
            .validate()
            .expect_err("duplicate item ids should be rejected");
        assert!(
            error.to_string().contains("duplicate item id"),
            "unexpected error: {error}"
        );
    }

    #[test]
    fn validate_rejects_out_of_range_scale_values() {
        let definition: ChecklistDefinition = serde_json::from_value(serde_json::json!({
            "sections": [{
                "id": "S",
                "label": "Structural",
                "maxScore": 10,
                "groups": [{
                    "code": "TI",
                    "label": "Title",
                    "items": [{ "id": "STI01", "label": "a", "scale": [0, 6] }]
                }]
            }]
        }))
        .expect("shape should deserialize");

        let error = definition
            .validate()
            .expect_err("scale value above 5 should be rejected");
        assert!(
            error.to_string().contains("out-of-range scale value"),
            "unexpected error: {error}"
        );
    }

    #[test]
    fn validate_rejects_duplicate_group_ids() {
        let definition: ChecklistDefinition = serde_json::from_value(serde_json::json!({
            "sections": [{
                "id": "S",
                "label": "Structural",
                "maxScore": 10,
                "groups": [
                    { "code": "TI", "label": "Title", "items": [{ "id": "a", "label": "a", "scale": [0] }] },
                    { "code": "TI", "label": "Title again", "items": [{ "id": "b", "label": "b", "scale": [0] }] }
                ]
            }]
        }))
        .expect("shape should deserialize");

        let error = definition
            .validate()
            .expect_err("duplicate group ids should be rejected");
        assert!(
            error.to_string().contains("duplicate group id"),
            "unexpected error: {error}"
        );
    }

    #[test]
    fn reset_group_clears_member_scores_and_flag_and_is_idempotent() {
        let definition = sample_definition();
        let mut state = ChecklistState::default();
        state.rate("STI01", 3);
        state.rate("STI02", 5);
        state.rate("M1CL01", 5);
        state.commit_group("S-TI");

        let group = definition.find_group("S-TI").expect("group should exist");
        state.reset_group(&group);

        assert!(state.score("STI01").is_none());
        assert!(state.score("STI02").is_none());
        assert!(!state.is_committed("S-TI"));
        assert_eq!(state.score("M1CL01"), Some(5), "other groups untouched");

        let after_first = state.clone();
        state.reset_group(&group);
        assert_eq!(state, after_first, "resetting twice equals resetting once");
    }

    #[test]
    fn commit_is_legal_with_zero_rated_items() {
        let definition = sample_definition();
        let mut state = ChecklistState::default();

        state.commit_group("S-TI");
        assert!(state.is_committed("S-TI"));
        assert!(state.scores.is_empty());

        state.commit_all(&definition);
        assert!(state.is_committed("M1-CL"));
        assert_eq!(state.committed_groups.len(), 2);
    }

    #[test]
    fn state_serializes_with_slot_field_names() {
        let mut state = ChecklistState::default();
        state.rate("STI01", 4);
        state.commit_group("S-TI");

        let value = serde_json::to_value(&state).expect("state should serialize");
        assert_eq!(value["scores"]["STI01"], 4);
        assert_eq!(value["committedGroups"]["S-TI"], true);
    }
}
