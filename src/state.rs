//! Request lifecycle owned by the caller
//!
//! Uploads and saves take a `&mut RequestState` instead of consulting a
//! global flag. A second attempt while one is in flight is rejected, never
//! queued.

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum RequestState {
    #[default]
    Idle,
    InFlight,
    Done,
}

impl RequestState {
    pub(crate) fn is_in_flight(self) -> bool {
        self == RequestState::InFlight
    }

    /// Reject the attempt if another one is still running.
    pub(crate) fn ensure_ready(self) -> Result<(), AppError> {
        if self.is_in_flight() {
            return Err(AppError::Busy);
        }
        Ok(())
    }

    pub(crate) fn begin(&mut self) -> Result<(), AppError> {
        self.ensure_ready()?;
        *self = RequestState::InFlight;
        Ok(())
    }

    /// Mark completion. Called on success and failure alike so the action can be retried.
    pub(crate) fn finish(&mut self) {
        *self = RequestState::Done;
    }

    /// Run `op` between `begin` and `finish`.
    pub(crate) fn run<T>(
        &mut self,
        op: impl FnOnce() -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        self.begin()?;
        let result = op();
        self.finish();
        result
    }
}
