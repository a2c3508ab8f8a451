use std::fmt;
use std::str::FromStr;

use super::Value;

/// Named, observable piece of published state.
///
/// The set is fixed; every slot starts with a placeholder value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Last status line written by serial/concurrent/load units.
    Status,
    /// Payload delivered by the bridged legacy fetch.
    IncomingData,
    /// Mirror of the isolated counter.
    CounterValue,
    /// Result of the background load.
    Background,
}

impl Slot {
    /// All slots, in index order.
    pub const ALL: [Slot; 4] = [
        Slot::Status,
        Slot::IncomingData,
        Slot::CounterValue,
        Slot::Background,
    ];

    /// Stable external name (what collaborators read by).
    pub fn name(self) -> &'static str {
        match self {
            Slot::Status => "status",
            Slot::IncomingData => "incomingData",
            Slot::CounterValue => "counterValue",
            Slot::Background => "background",
        }
    }

    /// Value the slot holds before anything is published.
    pub fn placeholder(self) -> Value {
        match self {
            Slot::Status | Slot::IncomingData => Value::from("Loading..."),
            Slot::CounterValue => Value::Int(0),
            Slot::Background => Value::from("Waiting (main and global queue)..."),
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown slot name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown slot: {0}")]
pub struct UnknownSlot(pub String);

impl FromStr for Slot {
    type Err = UnknownSlot;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Slot::ALL
            .into_iter()
            .find(|slot| slot.name() == s.trim())
            .ok_or_else(|| UnknownSlot(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for slot in Slot::ALL {
            assert_eq!(slot.name().parse::<Slot>(), Ok(slot));
        }
        assert!("nope".parse::<Slot>().is_err());
    }

    #[test]
    fn index_matches_position() {
        for (i, slot) in Slot::ALL.into_iter().enumerate() {
            assert_eq!(slot.index(), i);
        }
    }
}
