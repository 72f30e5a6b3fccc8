use crate::domain::Dataset;
use crate::forecast::{run_forecast, ForecastService};
use crate::upload::{upload, CleaningService, UploadFile};
use crate::workflow::state::{transition, Event, SequenceToken, Stage, WorkflowState};
use std::sync::Arc;

/// The two remote collaborators of the workflow.
#[derive(Clone)]
pub struct Services {
    pub cleaner: Arc<dyn CleaningService>,
    pub forecaster: Arc<dyn ForecastService>,
}

impl Services {
    pub fn new(cleaner: Arc<dyn CleaningService>, forecaster: Arc<dyn ForecastService>) -> Self {
        Self {
            cleaner,
            forecaster,
        }
    }
}

/// Work handed out by the session for one issued request. Running it touches no shared state;
/// the resulting event is fed back through [`Session::resolve`].
#[derive(Debug, Clone)]
pub enum PendingRequest {
    Upload {
        token: SequenceToken,
        file: Option<UploadFile>,
    },
    Forecast {
        token: SequenceToken,
        dataset: Arc<Dataset>,
    },
}

impl PendingRequest {
    pub fn token(&self) -> SequenceToken {
        match self {
            PendingRequest::Upload { token, .. } | PendingRequest::Forecast { token, .. } => *token,
        }
    }

    pub async fn run(self, services: &Services) -> Event {
        match self {
            PendingRequest::Upload { token, file } => Event::UploadResolved {
                token,
                outcome: upload(services.cleaner.as_ref(), file.as_ref()).await,
            },
            PendingRequest::Forecast { token, dataset } => Event::ForecastResolved {
                token,
                outcome: run_forecast(services.forecaster.as_ref(), &dataset).await,
            },
        }
    }
}

/// Owner of the single [`WorkflowState`]. The state only changes by replacing it with the
/// output of the transition function.
pub struct Session {
    services: Services,
    state: WorkflowState,
    selected_file: Option<UploadFile>,
}

impl Session {
    pub fn new(services: Services) -> Self {
        Self {
            services,
            state: WorkflowState::default(),
            selected_file: None,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn selected_file(&self) -> Option<&UploadFile> {
        self.selected_file.as_ref()
    }

    /// Applies `event`; returns whether the state changed.
    pub fn dispatch(&mut self, event: Event) -> bool {
        let (next, changed) = transition(&self.state, &event);
        if changed {
            self.state = next;
        }
        changed
    }

    /// Starts an upload of `file`, superseding any upload still in flight.
    /// Returns `None` while a forecast is in flight.
    pub fn begin_upload(&mut self, file: Option<UploadFile>) -> Option<PendingRequest> {
        if !self.dispatch(Event::UploadRequested) {
            return None;
        }
        self.selected_file = file.clone();
        Some(PendingRequest::Upload {
            token: self.state.upload_token(),
            file,
        })
    }

    pub fn begin_forecast(&mut self) -> Option<PendingRequest> {
        if !self.dispatch(Event::ForecastRequested) {
            return None;
        }
        self.pending_forecast()
    }

    /// Re-issues the action behind the current error stage.
    pub fn begin_retry(&mut self) -> Option<PendingRequest> {
        if !self.dispatch(Event::Retry) {
            return None;
        }
        match self.state.stage() {
            Stage::Uploading => Some(PendingRequest::Upload {
                token: self.state.upload_token(),
                file: self.selected_file.clone(),
            }),
            Stage::Forecasting => self.pending_forecast(),
            _ => None,
        }
    }

    pub fn resolve(&mut self, event: Event) -> bool {
        self.dispatch(event)
    }

    pub async fn upload(&mut self, file: Option<UploadFile>) -> &WorkflowState {
        if let Some(pending) = self.begin_upload(file) {
            self.complete(pending).await;
        }
        &self.state
    }

    pub async fn forecast(&mut self) -> &WorkflowState {
        if let Some(pending) = self.begin_forecast() {
            self.complete(pending).await;
        }
        &self.state
    }

    pub async fn retry(&mut self) -> &WorkflowState {
        if let Some(pending) = self.begin_retry() {
            self.complete(pending).await;
        }
        &self.state
    }

    async fn complete(&mut self, pending: PendingRequest) {
        let event = pending.run(&self.services).await;
        self.resolve(event);
    }

    fn pending_forecast(&self) -> Option<PendingRequest> {
        let dataset = self.state.dataset()?.clone();
        Some(PendingRequest::Forecast {
            token: self.state.forecast_token(),
            dataset,
        })
    }
}
