//! Named on/off switches saved with the game.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct FlagRecord {
    pub(crate) name: String,
    pub(crate) value: bool,
}

/// Flags in creation order. Unknown names read as unset; a leading `!` reads
/// the negation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct Flags {
    flags: Vec<FlagRecord>,
}

impl Flags {
    pub(crate) fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub(crate) fn value(&self, name: &str) -> bool {
        let (negated, name) = split_negation(name);
        let set = self
            .flags
            .iter()
            .find(|flag| flag.name == name)
            .is_some_and(|flag| flag.value);
        set != negated
    }

    /// Flips the flag and returns its new value.
    pub(crate) fn toggle(&mut self, name: &str) -> bool {
        let flag = self.entry(name);
        flag.value = !flag.value;
        debug!(flag = %flag.name, value = flag.value, "flag_toggled");
        flag.value
    }

    pub(crate) fn enable(&mut self, name: &str) {
        self.entry(name).value = true;
    }

    pub(crate) fn disable(&mut self, name: &str) {
        self.entry(name).value = false;
    }

    fn entry(&mut self, name: &str) -> &mut FlagRecord {
        let (_, name) = split_negation(name);
        let index = match self.flags.iter().position(|flag| flag.name == name) {
            Some(index) => index,
            None => {
                warn!(flag = name, "flag_created");
                self.flags.push(FlagRecord {
                    name: name.to_string(),
                    value: false,
                });
                self.flags.len() - 1
            }
        };
        &mut self.flags[index]
    }
}

fn split_negation(name: &str) -> (bool, &str) {
    match name.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_flags_read_unset_and_negate() {
        let flags = Flags::default();
        assert!(!flags.value("lamp-lit"));
        assert!(flags.value("!lamp-lit"));
        assert!(flags.is_empty());
    }

    #[test]
    fn toggle_creates_then_flips() {
        let mut flags = Flags::default();
        assert!(flags.toggle("lamp-lit"));
        assert!(!flags.value("!lamp-lit"));
        assert!(!flags.toggle("lamp-lit"));
        assert!(!flags.value("lamp-lit"));
    }

    #[test]
    fn enable_and_disable_strip_the_negation() {
        let mut flags = Flags::default();
        flags.enable("!door-open");
        assert!(flags.value("door-open"));
        flags.disable("door-open");
        assert!(flags.value("!door-open"));
        assert_eq!(
            serde_json::to_value(&flags).expect("encode"),
            json!([{"name": "door-open", "value": false}])
        );
    }

    #[test]
    fn saved_list_round_trips() {
        let value = json!([{"name": "a", "value": true}, {"name": "b", "value": false}]);
        let flags: Flags = serde_json::from_value(value.clone()).expect("decode");
        assert!(flags.value("a"));
        assert!(flags.value("!b"));
        assert_eq!(serde_json::to_value(&flags).expect("encode"), value);
    }
}
