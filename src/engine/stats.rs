//! Session statistics

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub push_messages: u64,
    pub pull_cycles_started: u64,
    pub pull_cycles_applied: u64,
    pub pull_cycles_ignored: u64,
    pub updates_accepted: u64,
    pub stale_pulls_discarded: u64,
    pub malformed_payloads: u64,
    pub dropped_messages: u64,
    pub activity_recorded: u64,
    pub log_entries_received: u64,
}
