//! Debounced autosave as an explicit state object.
//!
//! The controller never touches the network itself. The editor asks it what
//! to do after each edit, when the pending deadline is, and brackets every
//! persistence call with [`SyncController::begin_flush`] /
//! [`SyncController::finish_flush`]. Time is passed in, so the whole thing
//! runs on tokio's clock and can be driven by paused-time tests.

use std::time::Duration;
use tokio::time::Instant;

/// Quiet period before a debounced save fires
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1500);

/// What the user sees next to the report title
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Saved,
    Unsaved,
    Saving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Pending { deadline: Instant },
    InFlight,
}

/// Returned by [`SyncController::record_edit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// A debounced save is scheduled; nothing to do now
    Wait,
    /// Persist right away
    FlushNow,
}

/// Proof that a flush was started; hand it back to `finish_flush`
#[derive(Debug)]
#[must_use]
pub struct FlushTicket {
    edits_at_start: u64,
}

#[derive(Debug)]
pub struct SyncController {
    delay: Duration,
    phase: Phase,
    status: SyncStatus,
    /// Bumped on every local edit
    edits: u64,
    /// Edit seen while a flush was in flight, waiting for the flush to end
    edit_during_flight: Option<bool>,
}

impl SyncController {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            phase: Phase::Idle,
            status: SyncStatus::Saved,
            edits: 0,
            edit_during_flight: None,
        }
    }

    pub fn status(&self) -> SyncStatus {
        self.status
    }

    /// Deadline of the pending debounced save, if one is scheduled
    pub fn deadline(&self) -> Option<Instant> {
        match self.phase {
            Phase::Pending { deadline } => Some(deadline),
            _ => None,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        matches!(self.phase, Phase::Pending { deadline } if deadline <= now)
    }

    /// Note a local mutation. Immediate edits cancel any pending debounce.
    pub fn record_edit(&mut self, now: Instant, immediate: bool) -> SyncAction {
        self.edits += 1;

        match self.phase {
            Phase::InFlight => {
                // Picked up once the running flush finishes
                let already_immediate = self.edit_during_flight.unwrap_or(false);
                self.edit_during_flight = Some(already_immediate || immediate);
                SyncAction::Wait
            }
            Phase::Idle | Phase::Pending { .. } => {
                self.status = SyncStatus::Unsaved;
                if immediate {
                    self.phase = Phase::Idle;
                    SyncAction::FlushNow
                } else {
                    self.phase = Phase::Pending {
                        deadline: now + self.delay,
                    };
                    SyncAction::Wait
                }
            }
        }
    }

    /// Start a flush. `None` while another flush is in flight or nothing is unsaved.
    pub fn begin_flush(&mut self) -> Option<FlushTicket> {
        if self.phase == Phase::InFlight || self.status == SyncStatus::Saved {
            return None;
        }
        self.phase = Phase::InFlight;
        self.status = SyncStatus::Saving;
        Some(FlushTicket {
            edits_at_start: self.edits,
        })
    }

    /// End a flush. A failure leaves the report unsaved with nothing scheduled;
    /// the next edit or navigation retries. Returns `FlushNow` when an immediate
    /// edit arrived mid-flight and still needs its own save.
    pub fn finish_flush(&mut self, ticket: FlushTicket, succeeded: bool, now: Instant) -> SyncAction {
        self.phase = Phase::Idle;
        let edited_meanwhile = self.edits != ticket.edits_at_start;
        let immediate_meanwhile = self.edit_during_flight.take().unwrap_or(false);

        if !edited_meanwhile {
            self.status = if succeeded { SyncStatus::Saved } else { SyncStatus::Unsaved };
            return SyncAction::Wait;
        }

        self.status = SyncStatus::Unsaved;
        if immediate_meanwhile {
            SyncAction::FlushNow
        } else {
            self.phase = Phase::Pending {
                deadline: now + self.delay,
            };
            SyncAction::Wait
        }
    }
}

impl Default for SyncController {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn starts_saved_and_idle() {
        let sync = SyncController::default();
        assert_eq!(sync.status(), SyncStatus::Saved);
        assert_eq!(sync.deadline(), None);
    }

    #[test]
    fn each_edit_pushes_the_deadline() {
        let t0 = Instant::now();
        let mut sync = SyncController::new(ms(1500));

        assert_eq!(sync.record_edit(t0, false), SyncAction::Wait);
        assert_eq!(sync.status(), SyncStatus::Unsaved);
        assert_eq!(sync.record_edit(t0 + ms(1000), false), SyncAction::Wait);

        assert!(!sync.is_due(t0 + ms(1600)));
        assert!(sync.is_due(t0 + ms(2500)));
        assert_eq!(sync.deadline(), Some(t0 + ms(2500)));
    }

    #[test]
    fn immediate_edit_cancels_pending() {
        let t0 = Instant::now();
        let mut sync = SyncController::new(ms(1500));
        sync.record_edit(t0, false);

        assert_eq!(sync.record_edit(t0 + ms(10), true), SyncAction::FlushNow);
        assert_eq!(sync.deadline(), None);
        assert!(!sync.is_due(t0 + ms(5000)));
    }

    #[test]
    fn flush_cycle_reaches_saved() {
        let t0 = Instant::now();
        let mut sync = SyncController::default();
        sync.record_edit(t0, false);

        let ticket = sync.begin_flush().unwrap();
        assert_eq!(sync.status(), SyncStatus::Saving);
        assert!(sync.begin_flush().is_none(), "no re-entrant flush");

        assert_eq!(sync.finish_flush(ticket, true, t0), SyncAction::Wait);
        assert_eq!(sync.status(), SyncStatus::Saved);
        assert!(sync.begin_flush().is_none(), "nothing left to save");
    }

    #[test]
    fn failed_flush_stays_unsaved_without_retry() {
        let t0 = Instant::now();
        let mut sync = SyncController::default();
        sync.record_edit(t0, true);

        let ticket = sync.begin_flush().unwrap();
        assert_eq!(sync.finish_flush(ticket, false, t0), SyncAction::Wait);
        assert_eq!(sync.status(), SyncStatus::Unsaved);
        assert_eq!(sync.deadline(), None);
        // An explicit flush may try again
        assert!(sync.begin_flush().is_some());
    }

    #[test]
    fn edit_during_flight_is_rescheduled() {
        let t0 = Instant::now();
        let mut sync = SyncController::new(ms(1500));
        sync.record_edit(t0, true);
        let ticket = sync.begin_flush().unwrap();

        assert_eq!(sync.record_edit(t0 + ms(100), false), SyncAction::Wait);
        assert_eq!(sync.finish_flush(ticket, true, t0 + ms(200)), SyncAction::Wait);
        assert_eq!(sync.status(), SyncStatus::Unsaved);
        assert_eq!(sync.deadline(), Some(t0 + ms(1700)));
    }

    #[test]
    fn immediate_edit_during_flight_flushes_after() {
        let t0 = Instant::now();
        let mut sync = SyncController::default();
        sync.record_edit(t0, false);
        let ticket = sync.begin_flush().unwrap();

        sync.record_edit(t0, true);
        assert_eq!(sync.finish_flush(ticket, true, t0), SyncAction::FlushNow);
        assert_eq!(sync.status(), SyncStatus::Unsaved);
    }
}
