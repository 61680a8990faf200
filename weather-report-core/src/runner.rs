//! Run the pipeline now, then once a day at the scheduled time.

use std::{future::Future, io};

use tracing::{error, info};

use crate::{
    error::MalformedResponse,
    pipeline::Pipeline,
    schedule::{DailySchedule, local_now, sleep_until},
};

#[derive(Debug)]
pub struct Runner {
    pipeline: Pipeline,
    schedule: DailySchedule,
}

impl Runner {
    pub fn new(pipeline: Pipeline, schedule: DailySchedule) -> Self {
        Self { pipeline, schedule }
    }

    /// Run until Ctrl-C. Only a fatal run error ends the loop early.
    pub async fn run_forever(&self) -> Result<(), MalformedResponse> {
        self.run_until(shutdown_on(tokio::signal::ctrl_c())).await
    }

    /// One immediate run, then one run per trigger until `shutdown` completes.
    ///
    /// Runs never overlap: the next trigger is only armed once the current
    /// run has returned. A trigger that passed while a run was in progress
    /// fires as soon as that run ends.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<(), MalformedResponse>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        // armed before the first run
        let mut next = self.schedule.next_after(local_now());
        info!(at = %self.schedule.at(), %next, "daily trigger registered");

        self.pipeline.run_once().await?;

        loop {
            tokio::select! {
                _ = sleep_until(next) => {}
                _ = &mut shutdown => return Ok(()),
            }

            self.pipeline.run_once().await?;
            next = self.schedule.next_after(local_now());
            info!(%next, "next run scheduled");
        }
    }
}

/// Completes when `signal` fires. If the handler could not be installed the
/// future never completes, leaving the process to run until killed.
async fn shutdown_on<S>(signal: S)
where
    S: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("shutdown requested"),
        Err(err) => {
            error!(error = %err, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    }
}
