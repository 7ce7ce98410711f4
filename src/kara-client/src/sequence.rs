/// Monotonic request number for one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Last-write-wins ordering for responses to a single resource.
///
/// Every request takes a ticket before it is sent. A response is applied only
/// if its ticket is newer than the last applied one, so a slow early request
/// cannot overwrite the result of a later one.
#[derive(Debug, Default)]
pub struct SequenceGuard {
    issued: u64,
    applied: u64,
}

impl SequenceGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    /// Returns `true` and records the ticket if its response may be applied.
    pub fn accept(&mut self, ticket: Ticket) -> bool {
        if ticket.0 <= self.applied {
            return false;
        }
        self.applied = ticket.0;
        true
    }
}
