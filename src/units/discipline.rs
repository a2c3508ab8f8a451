use std::fmt;

/// Concurrency policy a unit executes under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Discipline {
    /// FIFO, one at a time, publish acknowledged before the next unit starts.
    Serial,
    /// Unordered; units may run simultaneously.
    Concurrent,
    /// Serialized with every counter operation on the counter's mailbox.
    Isolated,
    /// Resolved by an external one-shot callback.
    Bridged,
}

impl Discipline {
    /// Short stable label for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Discipline::Serial => "serial",
            Discipline::Concurrent => "concurrent",
            Discipline::Isolated => "isolated",
            Discipline::Bridged => "bridged",
        }
    }
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
