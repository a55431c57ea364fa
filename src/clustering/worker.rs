//! Background clustering thread.
//!
//! Jobs are submitted over a `crossbeam-channel`; each job streams its
//! progress back on a per-job channel and ends with a single
//! [`WorkerEvent::Finished`]. Input data is moved into the job, so the caller
//! keeps no shared references to it.

use crate::clustering::agglomerative::{AgglomerativeClusterer, ClusterOutcome};
use crate::embedding::{DocId, Embedding};
use crate::error::{IndexError, Result};
use crate::progress::{self, CancelToken, ProgressError, ProgressSink, ProgressUpdate};
use crossbeam_channel::{Receiver, Sender};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::JoinHandle;

/// Message from a running job.
#[derive(Debug)]
pub enum WorkerEvent<K> {
    Progress(ProgressUpdate),
    /// Terminal message; nothing follows it.
    Finished(Result<ClusterOutcome<K>>),
}

struct Job<K> {
    items: Vec<Embedding<K>>,
    cancel: CancelToken,
    events: Sender<WorkerEvent<K>>,
}

/// Progress sink that forwards updates to a job handle.
///
/// Once the handle is gone the job has no audience, so the sink cancels it.
pub struct ChannelSink<K> {
    events: Sender<WorkerEvent<K>>,
    cancel: CancelToken,
}

impl<K> ProgressSink for ChannelSink<K> {
    fn report(&mut self, update: &ProgressUpdate) -> std::result::Result<(), ProgressError> {
        if self.events.send(WorkerEvent::Progress(update.clone())).is_err() {
            self.cancel.cancel();
            return Err("job handle dropped".into());
        }
        Ok(())
    }
}

/// Caller's side of one submitted job.
#[derive(Debug)]
pub struct ClusterJobHandle<K> {
    events: Receiver<WorkerEvent<K>>,
    cancel: CancelToken,
}

impl<K> ClusterJobHandle<K> {
    /// Ask the job to stop at its next progress point.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Block for the next event.
    pub fn recv(&self) -> Result<WorkerEvent<K>> {
        self.events
            .recv()
            .map_err(|_| IndexError::Worker("worker stopped before the job finished".to_string()))
    }

    /// Block until the job finishes, discarding progress.
    pub fn wait(self) -> Result<ClusterOutcome<K>> {
        loop {
            if let WorkerEvent::Finished(result) = self.recv()? {
                return result;
            }
        }
    }

    /// Block until the job finishes, forwarding progress to `sink`.
    pub fn wait_with(self, sink: &mut dyn ProgressSink) -> Result<ClusterOutcome<K>> {
        loop {
            match self.recv()? {
                WorkerEvent::Progress(update) => progress::deliver(sink, update),
                WorkerEvent::Finished(result) => return result,
            }
        }
    }
}

/// A dedicated thread running clustering jobs one at a time.
///
/// Dropping the worker closes the job queue and joins the thread after the
/// queued jobs have run.
pub struct ClusterWorker<K> {
    jobs: Option<Sender<Job<K>>>,
    thread: Option<JoinHandle<()>>,
}

impl<K: DocId + Send + 'static> ClusterWorker<K> {
    pub fn spawn(clusterer: AgglomerativeClusterer) -> Result<Self> {
        let (jobs, queue) = crossbeam_channel::unbounded::<Job<K>>();
        let thread = std::thread::Builder::new()
            .name("simcheck-cluster".into())
            .spawn(move || run(clusterer, queue))?;
        Ok(Self {
            jobs: Some(jobs),
            thread: Some(thread),
        })
    }

    /// Queue a clustering job over `items`.
    pub fn submit(&self, items: Vec<Embedding<K>>) -> Result<ClusterJobHandle<K>> {
        let (events, receiver) = crossbeam_channel::unbounded();
        let cancel = CancelToken::new();
        let job = Job {
            items,
            cancel: cancel.clone(),
            events,
        };
        self.jobs
            .as_ref()
            .ok_or_else(|| IndexError::Worker("worker is shut down".to_string()))?
            .send(job)
            .map_err(|_| IndexError::Worker("worker thread exited".to_string()))?;
        Ok(ClusterJobHandle {
            events: receiver,
            cancel,
        })
    }

    /// Close the queue and wait for the thread to finish.
    pub fn shutdown(mut self) -> Result<()> {
        self.stop()
    }

    fn stop(&mut self) -> Result<()> {
        self.jobs.take();
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .map_err(|_| IndexError::Worker("worker thread panicked".to_string())),
            None => Ok(()),
        }
    }
}

impl<K> Drop for ClusterWorker<K> {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("cluster worker thread panicked");
            }
        }
    }
}

fn run<K: DocId>(clusterer: AgglomerativeClusterer, queue: Receiver<Job<K>>) {
    for Job {
        items,
        cancel,
        events,
    } in queue.iter()
    {
        let mut sink = ChannelSink {
            events: events.clone(),
            cancel: cancel.clone(),
        };
        let result = catch_unwind(AssertUnwindSafe(|| {
            clusterer.cluster_and_assign(items, &mut sink, &cancel)
        }))
        .unwrap_or_else(|_| Err(IndexError::Worker("clustering job panicked".to_string())));

        match &result {
            Ok(outcome) => tracing::debug!(k = outcome.k, items = outcome.clustering.len(), "cluster job finished"),
            Err(IndexError::Cancelled) => tracing::warn!("cluster job cancelled"),
            Err(error) => tracing::warn!(%error, "cluster job failed"),
        }
        // The handle may already be gone.
        let _ = events.send(WorkerEvent::Finished(result));
    }
}
