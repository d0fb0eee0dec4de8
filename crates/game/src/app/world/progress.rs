use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use super::entities::{NpcType, BOTTOM_DRAWER_LEVEL, TOP_DRAWER_LEVEL};

#[derive(Debug, Error)]
pub(crate) enum ProgressError {
    #[error("progress level {level} is out of range (table has {count} levels)")]
    LevelOutOfRange { level: usize, count: usize },
    #[error("no progress level named {0:?}")]
    UnknownLevel(String),
    #[error("progress table is empty")]
    EmptyTable,
    #[error("parse progress table at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LevelRecord {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) dialog: BTreeMap<NpcType, String>,
    /// Complete allow-list of rooms for this level.
    pub(crate) unlocked_rooms: Vec<String>,
}

/// Ordered level table plus the current index into it.
#[derive(Debug, Clone)]
pub(crate) struct Progress {
    levels: Vec<LevelRecord>,
    current: usize,
}

impl Progress {
    pub(crate) fn new(levels: Vec<LevelRecord>) -> Result<Self, ProgressError> {
        if levels.is_empty() {
            return Err(ProgressError::EmptyTable);
        }
        Ok(Self { levels, current: 0 })
    }

    pub(crate) fn from_value(value: Value) -> Result<Self, ProgressError> {
        let levels: Vec<LevelRecord> =
            serde_path_to_error::deserialize(value).map_err(|err| ProgressError::Parse {
                path: err.path().to_string(),
                source: err.into_inner(),
            })?;
        Self::new(levels)
    }

    /// Built-in table used when no `progress.json` asset is shipped.
    pub(crate) fn standard() -> Self {
        let level = |name: &str, cat: &str, ghost: &str, rooms: &[&str]| LevelRecord {
            name: name.to_string(),
            dialog: BTreeMap::from([
                (NpcType::Cat, cat.to_string()),
                (NpcType::Ghost, ghost.to_string()),
            ]),
            unlocked_rooms: rooms.iter().map(|room| room.to_string()).collect(),
        };
        Self {
            levels: vec![
                level(
                    "start",
                    "Welcome to the cottage! Try picking things up. The greenhouse is through the left door.",
                    "You definitely should not be in the attic yet.",
                    &["hall", "greenhouse"],
                ),
                level(
                    "recovered-hushroom",
                    "A hushroom! The cellar is much too loud for it, mind you. Down you go.",
                    "Where is my radio? WHERE IS MY RADIO?",
                    &["hall", "greenhouse", "cellar"],
                ),
                level(
                    "returned-radio",
                    "The ghost seems happier. Something heavy went missing from the attic though.",
                    "Bring back my gravity stone and we are square.",
                    &["hall", "greenhouse", "cellar", "attic"],
                ),
                level(
                    "recovered-gravity-stone",
                    "You did it! Now, about dinner...",
                    "The stone floats! How delightfully spooky.",
                    &["hall", "greenhouse", "cellar", "attic"],
                ),
                level(
                    BOTTOM_DRAWER_LEVEL,
                    "The bottom drawer! The top one has a much bigger lock, I'm told.",
                    "Rummaging through my cabinet now, are we?",
                    &["hall", "greenhouse", "cellar", "attic"],
                ),
                level(
                    TOP_DRAWER_LEVEL,
                    "Both drawers open. There is nothing left in this cottage to unlock.",
                    "Keys that grow and shrink. Whatever next.",
                    &["hall", "greenhouse", "cellar", "attic"],
                ),
            ],
            current: 0,
        }
    }

    pub(crate) fn level(&self) -> usize {
        self.current
    }

    pub(crate) fn level_name(&self) -> &str {
        &self.levels[self.current].name
    }

    pub(crate) fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub(crate) fn level_index(&self, name: &str) -> Option<usize> {
        self.levels.iter().position(|level| level.name == name)
    }

    /// Forces the level; used when loading a save and by debug tooling.
    pub(crate) fn set_progress_level(&mut self, level: usize) -> Result<(), ProgressError> {
        if level >= self.levels.len() {
            let err = ProgressError::LevelOutOfRange {
                level,
                count: self.levels.len(),
            };
            warn!(error = %err, "progress_level_rejected");
            return Err(err);
        }
        self.current = level;
        info!(level, name = %self.levels[level].name, "progress_level_set");
        Ok(())
    }

    /// Moves forward to `level`; never moves backwards. Returns whether the level changed.
    pub(crate) fn increase_progress_level(&mut self, level: usize) -> Result<bool, ProgressError> {
        if level <= self.current {
            return Ok(false);
        }
        self.set_progress_level(level)?;
        Ok(true)
    }

    pub(crate) fn increase_progress_level_name(&mut self, name: &str) -> Result<bool, ProgressError> {
        let level = self
            .level_index(name)
            .ok_or_else(|| ProgressError::UnknownLevel(name.to_string()))?;
        self.increase_progress_level(level)
    }

    pub(crate) fn is_room_unlocked(&self, room: &str) -> bool {
        self.levels[self.current]
            .unlocked_rooms
            .iter()
            .any(|unlocked| unlocked == room)
    }

    pub(crate) fn get_dialog(&self, npc: NpcType) -> Option<&str> {
        self.levels[self.current].dialog.get(&npc).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn increase_never_moves_backwards() {
        let mut progress = Progress::standard();
        assert!(progress.increase_progress_level(2).expect("advance"));
        assert!(!progress.increase_progress_level(1).expect("no-op"));
        assert_eq!(progress.level(), 2);
    }

    #[test]
    fn set_rejects_out_of_range_and_keeps_level() {
        let mut progress = Progress::standard();
        progress.set_progress_level(1).expect("set level");
        let err = progress.set_progress_level(99).expect_err("out of range");
        assert!(matches!(err, ProgressError::LevelOutOfRange { level: 99, .. }));
        assert_eq!(progress.level(), 1);
    }

    #[test]
    fn increase_by_name_resolves_first_match() {
        let mut progress = Progress::standard();
        progress
            .increase_progress_level_name("returned-radio")
            .expect("known level");
        assert_eq!(progress.level_name(), "returned-radio");
        assert!(matches!(
            progress.increase_progress_level_name("nope"),
            Err(ProgressError::UnknownLevel(_))
        ));
    }

    #[test]
    fn unlocked_rooms_are_a_complete_allow_list() {
        let mut progress = Progress::standard();
        assert!(progress.is_room_unlocked("hall"));
        assert!(!progress.is_room_unlocked("attic"));
        progress
            .increase_progress_level_name("returned-radio")
            .expect("advance");
        assert!(progress.is_room_unlocked("attic"));
    }

    #[test]
    fn table_parses_from_json_with_missing_dialog() {
        let progress = Progress::from_value(json!([
            {"name": "only", "dialog": {"CAT": "meow"}, "unlockedRooms": ["hall"]}
        ]))
        .expect("parse table");
        assert_eq!(progress.get_dialog(NpcType::Cat), Some("meow"));
        assert_eq!(progress.get_dialog(NpcType::Ghost), None);
    }

    #[test]
    fn parse_errors_name_the_json_path() {
        let err = Progress::from_value(json!([{"name": "bad", "unlockedRooms": "hall"}]))
            .expect_err("rooms must be a list");
        match err {
            ProgressError::Parse { path, .. } => assert_eq!(path, "[0].unlockedRooms"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn empty_table_is_rejected() {
        assert!(matches!(
            Progress::new(Vec::new()),
            Err(ProgressError::EmptyTable)
        ));
    }
}
