use std::sync::Mutex;

/// Lifecycle of the publish step for one rendered artwork.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishState {
    #[default]
    Idle,
    InFlight,
    Done,
}

/// Admits at most one publish per rendered artwork.
///
/// `Idle -> InFlight` on [`PublishGuard::try_begin`]; the returned ticket moves
/// to `Done` on [`PublishTicket::complete`] or back to `Idle` when dropped.
#[derive(Debug, Default)]
pub struct PublishGuard {
    state: Mutex<PublishState>,
}

impl PublishGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PublishState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(PublishState::InFlight)
    }

    /// `None` while another publish is in flight or after one completed.
    pub fn try_begin(&self) -> Option<PublishTicket<'_>> {
        let mut state = self.state.lock().ok()?;
        if *state != PublishState::Idle {
            return None;
        }
        *state = PublishState::InFlight;
        Some(PublishTicket {
            guard: self,
            completed: false,
        })
    }

    fn set(&self, to: PublishState) {
        if let Ok(mut s) = self.state.lock() {
            *s = to;
        }
    }
}

#[derive(Debug)]
#[must_use = "dropping the ticket returns the guard to idle"]
pub struct PublishTicket<'a> {
    guard: &'a PublishGuard,
    completed: bool,
}

impl PublishTicket<'_> {
    pub fn complete(mut self) {
        self.completed = true;
        self.guard.set(PublishState::Done);
    }
}

impl Drop for PublishTicket<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.guard.set(PublishState::Idle);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/publish/guard.rs"]
mod tests;
