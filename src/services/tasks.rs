//! Access control tasks - one long-lived loop per event channel
//!
//! Each task alternates between Waiting (parked on its channel) and Acting
//! (one `PanelCore` step). There is no exit from the loop; tasks live as long
//! as the runtime.

use crate::domain::types::Source;
use crate::services::panel::PanelCore;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

pub struct AccessTask {
    source: Source,
    core: Arc<PanelCore>,
}

impl AccessTask {
    pub fn new(source: Source, core: Arc<PanelCore>) -> Self {
        Self { source, core }
    }

    pub async fn run(self) {
        info!(task = %self.source, "access_task_started");

        let channels = self.core.channels().clone();
        let channel = channels.get(self.source);
        loop {
            // Reset claims its signal only once it holds the gate
            if self.source == Source::Reset {
                channel.ready().await;
            } else {
                channel.wait().await;
            }

            match self.source {
                Source::Entry => {
                    let _ = self.core.handle_entry().await;
                }
                Source::Exit => {
                    let _ = self.core.handle_exit().await;
                }
                Source::Reset => {
                    self.core.handle_reset().await;
                }
            }
        }
    }
}

/// Render the initial state and spawn the entry, exit and reset tasks
pub fn spawn_access_tasks(core: Arc<PanelCore>) -> Vec<JoinHandle<()>> {
    core.refresh();

    Source::ALL
        .into_iter()
        .map(|source| tokio::spawn(AccessTask::new(source, core.clone()).run()))
        .collect()
}
