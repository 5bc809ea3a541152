//! Fixed-period reporting on a background thread.

use std::panic::catch_unwind;
use std::panic::AssertUnwindSafe;
use std::sync::mpsc;
use std::sync::mpsc::RecvTimeoutError;
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;
use std::time::Duration;

use series_client::SeriesPublisher;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::error::ScheduleError;
use crate::reporter::panic_message;
use crate::reporter::SeriesReporter;

const THREAD_NAME: &str = "series-reporter";

/// Handle to a running reporting thread.
///
/// The first cycle runs one period after start. Dropping the handle without
/// calling [`ReportingTask::stop`] also ends the thread, after its current
/// wait.
#[derive(Debug)]
pub struct ReportingTask {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
    period: Duration,
}

impl ReportingTask {
    pub fn start<P>(
        mut reporter: SeriesReporter<P>,
        period: Duration,
    ) -> Result<Self, ScheduleError>
    where
        P: SeriesPublisher + 'static,
    {
        if period.is_zero() {
            return Err(ScheduleError::ZeroPeriod);
        }

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = std::thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(period) {
                        Err(RecvTimeoutError::Timeout) => {
                            let tick = catch_unwind(AssertUnwindSafe(|| reporter.report()));
                            if let Err(payload) = tick {
                                error!(
                                    panic = panic_message(payload.as_ref()),
                                    "Reporting cycle panicked"
                                );
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("Reporting thread exiting");
            })?;

        info!(period_ms = period.as_millis() as u64, "Reporting task started");
        Ok(Self {
            stop_tx,
            handle: Some(handle),
            period,
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Signal the thread and wait for the cycle in flight, if any.
    pub fn stop(mut self) {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Reporting thread panicked");
            }
        }
        info!("Reporting task stopped");
    }
}
