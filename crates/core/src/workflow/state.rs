use crate::domain::{Dataset, ForecastResult};
use crate::error::{ForecastError, UploadError, WorkflowError};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Idle,
    Uploading,
    UploadError,
    Previewing,
    Forecasting,
    ForecastError,
    Displaying,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Uploading => "uploading",
            Stage::UploadError => "upload_error",
            Stage::Previewing => "previewing",
            Stage::Forecasting => "forecasting",
            Stage::ForecastError => "forecast_error",
            Stage::Displaying => "displaying",
        }
    }

    pub fn is_in_flight(self) -> bool {
        matches!(self, Stage::Uploading | Stage::Forecasting)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one issued request. Tokens only grow; a response is accepted only if it carries
/// the latest token issued for its stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SequenceToken(u64);

impl SequenceToken {
    pub fn value(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The user picked a file (or re-picked one) and an upload should start.
    UploadRequested,
    UploadResolved {
        token: SequenceToken,
        outcome: Result<Dataset, UploadError>,
    },
    ForecastRequested,
    ForecastResolved {
        token: SequenceToken,
        outcome: Result<ForecastResult, ForecastError>,
    },
    /// Re-run whichever action produced the current error.
    Retry,
}

impl Event {
    fn name(&self) -> &'static str {
        match self {
            Event::UploadRequested => "upload_requested",
            Event::UploadResolved { .. } => "upload_resolved",
            Event::ForecastRequested => "forecast_requested",
            Event::ForecastResolved { .. } => "forecast_resolved",
            Event::Retry => "retry",
        }
    }
}

/// The whole workflow at one instant. Values are replaced, never edited in place.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowState {
    stage: Stage,
    dataset: Option<Arc<Dataset>>,
    forecast: Option<Arc<ForecastResult>>,
    last_error: Option<WorkflowError>,
    upload_token: SequenceToken,
    forecast_token: SequenceToken,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self {
            stage: Stage::Idle,
            dataset: None,
            forecast: None,
            last_error: None,
            upload_token: SequenceToken::default(),
            forecast_token: SequenceToken::default(),
        }
    }
}

impl WorkflowState {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn dataset(&self) -> Option<&Arc<Dataset>> {
        self.dataset.as_ref()
    }

    pub fn forecast(&self) -> Option<&Arc<ForecastResult>> {
        self.forecast.as_ref()
    }

    pub fn last_error(&self) -> Option<&WorkflowError> {
        self.last_error.as_ref()
    }

    pub fn upload_token(&self) -> SequenceToken {
        self.upload_token
    }

    pub fn forecast_token(&self) -> SequenceToken {
        self.forecast_token
    }

    /// Token of the request the current stage is waiting on, if any.
    pub fn in_flight_token(&self) -> Option<SequenceToken> {
        match self.stage {
            Stage::Uploading => Some(self.upload_token),
            Stage::Forecasting => Some(self.forecast_token),
            _ => None,
        }
    }

    fn start_upload(&self) -> Self {
        Self {
            stage: Stage::Uploading,
            dataset: self.dataset.clone(),
            forecast: None,
            last_error: None,
            upload_token: self.upload_token.next(),
            forecast_token: self.forecast_token,
        }
    }

    fn start_forecast(&self) -> Self {
        Self {
            stage: Stage::Forecasting,
            forecast: None,
            last_error: None,
            forecast_token: self.forecast_token.next(),
            ..self.clone()
        }
    }

    fn with_stage(&self, stage: Stage) -> Self {
        Self {
            stage,
            ..self.clone()
        }
    }
}

/// Transition function of the workflow.
///
/// Returns `None` when `event` is illegal in the current stage or answers a superseded
/// request; callers keep the current state unchanged in that case.
pub fn reduce(state: &WorkflowState, event: &Event) -> Option<WorkflowState> {
    match (state.stage, event) {
        (Stage::Forecasting, Event::UploadRequested) => None,
        (_, Event::UploadRequested) => Some(state.start_upload()),

        (Stage::Uploading, Event::UploadResolved { token, outcome }) => {
            if *token != state.upload_token {
                return None;
            }
            Some(match outcome {
                Ok(dataset) => WorkflowState {
                    stage: Stage::Previewing,
                    dataset: Some(Arc::new(dataset.clone())),
                    forecast: None,
                    last_error: None,
                    ..state.clone()
                },
                Err(err) => WorkflowState {
                    last_error: Some(err.clone().into()),
                    ..state.with_stage(Stage::UploadError)
                },
            })
        }

        (Stage::Previewing, Event::ForecastRequested) => Some(state.start_forecast()),

        (Stage::Forecasting, Event::ForecastResolved { token, outcome }) => {
            if *token != state.forecast_token {
                return None;
            }
            Some(match outcome {
                Ok(result) if !result.is_empty() => WorkflowState {
                    stage: Stage::Displaying,
                    forecast: Some(Arc::new(result.clone())),
                    last_error: None,
                    ..state.clone()
                },
                Ok(_) => WorkflowState {
                    last_error: Some(ForecastError::EmptyResult.into()),
                    ..state.with_stage(Stage::ForecastError)
                },
                Err(err) => WorkflowState {
                    last_error: Some(err.clone().into()),
                    ..state.with_stage(Stage::ForecastError)
                },
            })
        }

        (Stage::UploadError, Event::Retry) => Some(state.start_upload()),
        (Stage::ForecastError, Event::Retry) => Some(state.start_forecast()),

        _ => None,
    }
}

/// [`reduce`] with the decision logged; returns the state to keep.
pub fn transition(state: &WorkflowState, event: &Event) -> (WorkflowState, bool) {
    match reduce(state, event) {
        Some(next) => {
            tracing::info!(
                event = event.name(),
                from = %state.stage,
                to = %next.stage,
                "workflow transition"
            );
            (next, true)
        }
        None => {
            match event {
                Event::UploadResolved { token, .. } | Event::ForecastResolved { token, .. } => {
                    tracing::warn!(
                        event = event.name(),
                        stage = %state.stage,
                        token = token.value(),
                        "discarding stale or unexpected response"
                    );
                }
                _ => {
                    tracing::debug!(
                        event = event.name(),
                        stage = %state.stage,
                        "event ignored in current stage"
                    );
                }
            }
            (state.clone(), false)
        }
    }
}
