use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::model::{ChecklistDefinition, ChecklistState};
use crate::util::write_json_pretty;

pub const STATE_FILE_NAME: &str = "checklist_state.json";

/// Permissive read-side shape for the slot: both maps default to empty and
/// unknown top-level fields are ignored, so older or richer slot documents
/// still hydrate.
#[derive(Debug, Default, Deserialize)]
struct PersistedSlot {
    #[serde(default)]
    scores: BTreeMap<String, u32>,
    #[serde(default, rename = "committedGroups")]
    committed_groups: BTreeMap<String, bool>,
}

/// The single user-local state slot. Reads fail soft to empty defaults and
/// writes are swallowed with a diagnostic: persistence problems never
/// surface past this module, and the in-memory state stays authoritative.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(state_root: &Path) -> Self {
        Self {
            path: state_root.join(STATE_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the slot. A missing file is the normal first-run case; anything
    /// unreadable or not matching the expected shape is treated as absent.
    pub fn load(&self) -> ChecklistState {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return ChecklistState::default(),
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "failed to read state slot, starting empty"
                );
                return ChecklistState::default();
            }
        };

        match serde_json::from_slice::<PersistedSlot>(&raw) {
            Ok(slot) => ChecklistState {
                scores: slot.scores,
                committed_groups: slot.committed_groups,
            },
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "state slot is not the expected shape, starting empty"
                );
                ChecklistState::default()
            }
        }
    }

    /// Load, then drop entries the current definition no longer knows about:
    /// scores for unknown items or with values outside the item's scale, and
    /// commit flags for unknown groups. Schema drift is expected and silent.
    pub fn load_validated(&self, definition: &ChecklistDefinition) -> ChecklistState {
        let mut state = self.load();

        state.scores.retain(|item_id, value| {
            match definition.find_item(item_id) {
                Some(entry) if entry.item.scale.contains(value) => true,
                Some(_) => {
                    debug!(item = %item_id, score = *value, "dropping out-of-scale score");
                    false
                }
                None => {
                    debug!(item = %item_id, "dropping score for unknown item");
                    false
                }
            }
        });

        state.committed_groups.retain(|group_id, _| {
            if definition.find_group(group_id).is_some() {
                true
            } else {
                debug!(group = %group_id, "dropping commit flag for unknown group");
                false
            }
        });

        state
    }

    /// Serialize and write the slot. Storage failure is logged and swallowed;
    /// a full disk or a read-only state root costs at most this one save.
    pub fn persist(&self, state: &ChecklistState) {
        if let Err(err) = self.try_persist(state) {
            warn!(
                path = %self.path.display(),
                error = %err,
                "failed to persist state, in-memory state remains authoritative"
            );
        }
    }

    fn try_persist(&self, state: &ChecklistState) -> Result<()> {
        write_json_pretty(&self.path, state)
    }

    /// Remove the slot entirely. A missing slot is not an error.
    pub fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "failed to remove state slot"
                );
            }
        }
    }
}
