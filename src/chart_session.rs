//! Lifecycle of chart-generation requests.
//!
//! Each attempt gets a fresh [`RequestId`]. A response is only honoured when its id
//! is still the latest one minted; anything older is superseded and dropped.
//! Cancelling mints a new id without issuing a request, which makes every
//! outstanding response stale.

use crate::{ChartSpec, ProfilerError, ProfilerResult};

use std::fmt;
use tracing::debug;

/// Monotonic token identifying one chart-generation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartRequestState {
    #[default]
    None,
    Pending(RequestId),
    Displayed(RequestId),
    Failed(RequestId),
}

/// What the caller must do with a resolved response.
#[derive(Debug)]
pub enum ChartOutcome {
    /// Latest request succeeded: hide the loader and draw the chart.
    Render(ChartSpec),
    /// Latest request failed: hide the loader, restore the placeholder, report the error.
    Failed(ProfilerError),
    /// An older request resolved: leave the display alone.
    Superseded,
}

#[derive(Debug, Clone, Default)]
pub struct ChartSession {
    latest: u64,
    state: ChartRequestState,
}

impl ChartSession {
    /// Starts a new attempt; every earlier attempt becomes stale.
    pub fn begin(&mut self) -> RequestId {
        let id = self.mint();
        self.state = ChartRequestState::Pending(id);
        id
    }

    /// Resolves the response of request `id`.
    pub fn resolve(&mut self, id: RequestId, result: ProfilerResult<ChartSpec>) -> ChartOutcome {
        if !self.is_latest(id) {
            debug!(
                "Discarding chart response {id}: {}",
                ProfilerError::SupersededResponse
            );
            return ChartOutcome::Superseded;
        }

        match result {
            Ok(spec) => {
                self.state = ChartRequestState::Displayed(id);
                ChartOutcome::Render(spec)
            }
            Err(err) => {
                self.state = ChartRequestState::Failed(id);
                ChartOutcome::Failed(ProfilerError::ChartGenerationFailed(err.detail()))
            }
        }
    }

    /// Invalidates any outstanding request and forgets the displayed chart.
    pub fn cancel(&mut self) {
        self.mint();
        self.state = ChartRequestState::None;
    }

    pub fn is_latest(&self, id: RequestId) -> bool {
        id.0 == self.latest
    }

    /// `true` while the latest attempt has not resolved.
    pub fn is_pending(&self) -> bool {
        matches!(self.state, ChartRequestState::Pending(_))
    }

    pub fn state(&self) -> ChartRequestState {
        self.state
    }

    fn mint(&mut self) -> RequestId {
        self.latest += 1;
        RequestId(self.latest)
    }
}
