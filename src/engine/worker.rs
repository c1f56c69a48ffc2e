use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};

use crate::engine::fog::Shared;
use crate::foundation::error::{FogError, FogResult};
use crate::paint::PaintOpts;
use crate::shape::Footprint;

/// Owned paint request executed by the worker.
#[derive(Debug)]
pub(crate) struct PaintJob {
    pub(crate) footprint: Footprint,
    pub(crate) new_alpha: f32,
    pub(crate) opts: PaintOpts,
    /// Clock time the paint was issued at; `None` uses the engine clock when the job runs.
    pub(crate) issued_at: Option<f64>,
}

pub(crate) enum WorkerMsg {
    Paint(PaintJob),
    /// Answered once every earlier message was handled.
    Fence(Sender<()>),
}

/// Worker thread plus its queue. Dropping it closes the queue and joins the thread.
pub(crate) struct Worker {
    tx: Option<Sender<WorkerMsg>>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    pub(crate) fn spawn(shared: Arc<Shared>) -> FogResult<Self> {
        let (tx, rx) = unbounded();
        let handle = std::thread::Builder::new()
            .name("fogmask-worker".to_string())
            .spawn(move || run(shared, rx))
            .map_err(|e| FogError::Other(anyhow::anyhow!("spawn fog worker thread: {e}")))?;
        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    /// Queue a paint. The job counts as pending until the worker finished it.
    pub(crate) fn submit(&self, shared: &Shared, job: PaintJob) -> FogResult<()> {
        let Some(tx) = &self.tx else {
            return Err(FogError::validation("fog worker is shut down"));
        };
        shared.pending.fetch_add(1, Ordering::AcqRel);
        if tx.send(WorkerMsg::Paint(job)).is_err() {
            shared.pending.fetch_sub(1, Ordering::AcqRel);
            return Err(FogError::validation("fog worker is shut down"));
        }
        Ok(())
    }

    /// Block until every job submitted before this call has run.
    pub(crate) fn wait_idle(&self) {
        let Some(tx) = &self.tx else {
            return;
        };
        let (done_tx, done_rx) = bounded(1);
        if tx.send(WorkerMsg::Fence(done_tx)).is_ok() {
            let _ = done_rx.recv();
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("fog worker thread panicked");
        }
    }
}

fn run(shared: Arc<Shared>, rx: Receiver<WorkerMsg>) {
    for msg in rx {
        match msg {
            WorkerMsg::Paint(job) => {
                {
                    let mut state = shared.state.lock();
                    shared.running.store(true, Ordering::Release);
                    let report = state.paint(&job);
                    shared.running.store(false, Ordering::Release);
                    tracing::trace!(
                        touched = report.touched,
                        scheduled = report.scheduled,
                        dropped = report.dropped,
                        "deferred paint applied"
                    );
                }
                shared.pending.fetch_sub(1, Ordering::AcqRel);
            }
            WorkerMsg::Fence(done) => {
                let _ = done.send(());
            }
        }
    }
    tracing::debug!("fog worker stopped");
}
