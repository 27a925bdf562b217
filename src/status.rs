use crate::error::{GastosError, Result};

/// Lifecycle of a user-triggered remote operation (fetch, create, delete).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OpState {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed(String),
}

impl OpState {
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::InFlight)
    }

    /// Enter `InFlight`. Refused while a previous run has not settled.
    pub fn begin(&mut self) -> Result<()> {
        if self.is_busy() {
            return Err(GastosError::Busy);
        }
        *self = Self::InFlight;
        Ok(())
    }

    /// Record the outcome of the run started by [`OpState::begin`].
    pub fn settle<T>(&mut self, result: &Result<T>) {
        *self = match result {
            Ok(_) => Self::Succeeded,
            Err(e) => Self::Failed(e.to_string()),
        };
    }
}

/// Hands out increasing tickets for fetches so a slow, older response can
/// never overwrite a newer one.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchSequence {
    issued: u64,
    applied: u64,
}

impl FetchSequence {
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Accept `ticket` if nothing newer has been applied yet.
    pub fn accept(&mut self, ticket: u64) -> bool {
        if ticket > self.applied && ticket <= self.issued {
            self.applied = ticket;
            true
        } else {
            false
        }
    }

    pub fn latest_applied(&self) -> u64 {
        self.applied
    }
}
