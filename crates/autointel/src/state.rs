use std::collections::HashMap;
use std::sync::Arc;

use autointel_core::{trigger, Orchestrator, RunHandle, RunOutcome, RunRequest};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Runs triggered through the HTTP facade that have not been collected yet.
pub struct AppState {
    orchestrator: Arc<Orchestrator>,
    in_flight: Mutex<HashMap<Uuid, RunHandle>>,
}

pub enum RunProgress {
    Running,
    Finished(RunOutcome),
    Unknown,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator) -> Arc<Self> {
        Arc::new(AppState {
            orchestrator: Arc::new(orchestrator),
            in_flight: Mutex::new(HashMap::new()),
        })
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    pub async fn start(&self, request: RunRequest) -> Uuid {
        let handle = trigger(Arc::clone(&self.orchestrator), request);
        let run_id = handle.run_id();
        let mut in_flight = self.in_flight.lock().await;
        // Finished runs are served from the report store from here on.
        in_flight.retain(|_, handle| !handle.is_finished());
        in_flight.insert(run_id, handle);
        run_id
    }

    /// Progress of a run this process started. A finished run is collected once.
    pub async fn progress(&self, run_id: Uuid) -> RunProgress {
        let mut in_flight = self.in_flight.lock().await;
        match in_flight.get(&run_id) {
            None => return RunProgress::Unknown,
            Some(handle) if !handle.is_finished() => return RunProgress::Running,
            Some(_) => {}
        }
        let Some(handle) = in_flight.remove(&run_id) else {
            return RunProgress::Unknown;
        };
        drop(in_flight);

        match handle.wait().await {
            Ok(outcome) => RunProgress::Finished(outcome),
            Err(err) => {
                tracing::error!(run_id = %run_id, error = %err, "run task failed");
                RunProgress::Unknown
            }
        }
    }
}
