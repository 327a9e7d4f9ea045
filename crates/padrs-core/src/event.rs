// padrs Game Events
// Notifications raised by the external memory reader

use std::fmt;

/// Discrete notification consumed by the scheduler.
///
/// Events carry no payload. The reader raises [`GameEvent::AddressFound`]
/// once per address-table refresh and [`GameEvent::ProcessClosed`] once when
/// the observed process goes away; each delivery wakes every routine
/// currently waiting on that event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameEvent {
    /// The address table has fresh entries to look up.
    AddressFound,
    /// The observed process exited; cached addresses are stale.
    ProcessClosed,
}

impl GameEvent {
    /// Stable display name, used in task names and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            GameEvent::AddressFound => "AddressFound",
            GameEvent::ProcessClosed => "ProcessClosed",
        }
    }
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_display() {
        assert_eq!(GameEvent::AddressFound.to_string(), "AddressFound");
        assert_eq!(GameEvent::ProcessClosed.to_string(), "ProcessClosed");
    }

    #[test]
    fn test_event_equality() {
        assert_eq!(GameEvent::AddressFound, GameEvent::AddressFound);
        assert_ne!(GameEvent::AddressFound, GameEvent::ProcessClosed);
    }
}
