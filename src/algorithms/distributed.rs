//! Pull-based work distribution for CLARA.
//!
//! Workers announce themselves with a [`ToCoordinator::WorkRequest`]. The coordinator
//! answers with a sample while sampling iterations remain; every returned result is an
//! implicit request for more. Once all results are in and every worker has asked for
//! work it will not get, each worker receives [`ToWorker::Terminate`].

use std::sync::mpsc::{channel, Receiver, Sender};

use super::*;
use crate::data::Matrix;
use crate::measure::Dissimilarity;
use crate::types::{keep_best, ClusterResult};

#[derive(Debug, Clone, PartialEq)]
pub enum ToCoordinator<T> {
    WorkRequest {
        worker: usize,
    },
    /// Medoids of a clustered sample, indexed into the full dataset.
    WorkResult {
        worker: usize,
        medoids: Matrix<T>,
        medoid_indices: Vec<usize>,
    },
    WorkFailed {
        worker: usize,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToWorker<T> {
    Work(Sample<T>),
    Terminate,
}

/// The coordinator's view of the transport.
pub trait CoordinatorEndpoint<T> {
    fn num_workers(&self) -> usize;

    /// Blocks until any worker sends something.
    fn recv(&self) -> Result<ToCoordinator<T>>;

    fn send(&self, worker: usize, message: ToWorker<T>) -> Result<()>;
}

/// A worker's view of the transport.
pub trait WorkerEndpoint<T> {
    fn id(&self) -> usize;

    fn send(&self, message: ToCoordinator<T>) -> Result<()>;

    fn recv(&self) -> Result<ToWorker<T>>;
}

pub struct ChannelCoordinator<T> {
    inbox: Receiver<ToCoordinator<T>>,
    outboxes: Vec<Sender<ToWorker<T>>>,
}

pub struct ChannelWorker<T> {
    id: usize,
    outbox: Sender<ToCoordinator<T>>,
    inbox: Receiver<ToWorker<T>>,
}

/// In-process transport: one shared inbox for the coordinator, one inbox per worker.
pub fn channel_transport<T>(num_workers: usize) -> (ChannelCoordinator<T>, Vec<ChannelWorker<T>>) {
    let (to_coordinator, inbox) = channel();
    let mut outboxes = Vec::with_capacity(num_workers);
    let mut workers = Vec::with_capacity(num_workers);

    for id in 0..num_workers {
        let (outbox, worker_inbox) = channel();
        outboxes.push(outbox);
        workers.push(ChannelWorker {
            id,
            outbox: to_coordinator.clone(),
            inbox: worker_inbox,
        });
    }

    (ChannelCoordinator { inbox, outboxes }, workers)
}

impl<T> CoordinatorEndpoint<T> for ChannelCoordinator<T> {
    fn num_workers(&self) -> usize {
        self.outboxes.len()
    }

    fn recv(&self) -> Result<ToCoordinator<T>> {
        self.inbox
            .recv()
            .map_err(|_| Error::Protocol("every worker hung up".into()))
    }

    fn send(&self, worker: usize, message: ToWorker<T>) -> Result<()> {
        let outbox = self.outboxes.get(worker).ok_or(Error::IndexOutOfBounds {
            index: worker,
            len: self.outboxes.len(),
        })?;
        outbox
            .send(message)
            .map_err(|_| Error::Protocol(format!("worker {} hung up", worker)))
    }
}

impl<T> WorkerEndpoint<T> for ChannelWorker<T> {
    fn id(&self) -> usize {
        self.id
    }

    fn send(&self, message: ToCoordinator<T>) -> Result<()> {
        self.outbox
            .send(message)
            .map_err(|_| Error::Protocol("coordinator hung up".into()))
    }

    fn recv(&self) -> Result<ToWorker<T>> {
        self.inbox
            .recv()
            .map_err(|_| Error::Protocol("coordinator hung up".into()))
    }
}

/// Draws samples, hands them out on request and scores returned medoids on `data`.
pub struct Coordinator<'a, T> {
    pub data: &'a Matrix<T>,
    pub sample_size: usize,
    pub sampling_iterations: usize,
    pub dissimilarity: Dissimilarity,
    pub executor: &'a Executor,
}

impl<'a, T: Float> Coordinator<'a, T> {
    pub fn run<E: CoordinatorEndpoint<T>>(
        &self,
        endpoint: &E,
        selector: &mut UniformSelector,
    ) -> Result<ClusterResult<T>> {
        let num_workers = endpoint.num_workers();
        let mut busy = vec![false; num_workers];
        let mut idle = vec![false; num_workers];
        let mut issued = 0;
        let mut outstanding = 0;
        let mut best = None;

        while issued < self.sampling_iterations || outstanding > 0 {
            let worker = match endpoint.recv()? {
                ToCoordinator::WorkRequest { worker } => {
                    check_worker(worker, num_workers)?;
                    if busy[worker] || idle[worker] {
                        return Err(Error::Protocol(format!(
                            "worker {} requested work twice",
                            worker
                        )));
                    }
                    worker
                }
                ToCoordinator::WorkResult {
                    worker,
                    medoids,
                    medoid_indices,
                } => {
                    check_worker(worker, num_workers)?;
                    if !busy[worker] {
                        return Err(Error::Protocol(format!(
                            "worker {} returned a result it was never asked for",
                            worker
                        )));
                    }
                    busy[worker] = false;
                    outstanding -= 1;

                    let candidate = ClusterResult::evaluate(
                        self.data,
                        medoids,
                        medoid_indices,
                        self.dissimilarity,
                        self.executor,
                    );
                    let cost = candidate.cost;
                    if keep_best(&mut best, candidate) {
                        tracing::debug!(worker, cost = ?cost, "worker result is the new best");
                    }
                    worker
                }
                ToCoordinator::WorkFailed { worker, reason } => {
                    return Err(Error::Protocol(format!("worker {} failed: {}", worker, reason)));
                }
            };

            if issued < self.sampling_iterations {
                let sample = Sample::draw(self.data, self.sample_size, selector)?;
                endpoint.send(worker, ToWorker::Work(sample))?;
                tracing::trace!(worker, iteration = issued, "sample sent");
                busy[worker] = true;
                issued += 1;
                outstanding += 1;
            } else {
                idle[worker] = true;
            }
        }

        // Workers that have not asked yet are still owed an answer.
        let mut num_idle = idle.iter().filter(|&&i| i).count();
        while num_idle < num_workers {
            match endpoint.recv()? {
                ToCoordinator::WorkRequest { worker } if worker < num_workers && !idle[worker] => {
                    idle[worker] = true;
                    num_idle += 1;
                }
                ToCoordinator::WorkFailed { worker, reason } => {
                    return Err(Error::Protocol(format!("worker {} failed: {}", worker, reason)));
                }
                other => {
                    return Err(Error::Protocol(format!(
                        "unexpected message while winding down: {}",
                        describe(&other)
                    )));
                }
            }
        }

        for worker in 0..num_workers {
            endpoint.send(worker, ToWorker::Terminate)?;
        }
        tracing::debug!(workers = num_workers, samples = issued, "workers terminated");

        best.ok_or_else(|| Error::Protocol("no worker results were received".into()))
    }
}

fn check_worker(worker: usize, num_workers: usize) -> Result<()> {
    if worker >= num_workers {
        return Err(Error::Protocol(format!(
            "message from unknown worker {} ({} workers)",
            worker, num_workers
        )));
    }
    Ok(())
}

fn describe<T>(message: &ToCoordinator<T>) -> String {
    match message {
        ToCoordinator::WorkRequest { worker } => format!("request from worker {}", worker),
        ToCoordinator::WorkResult { worker, .. } => format!("result from worker {}", worker),
        ToCoordinator::WorkFailed { worker, .. } => format!("failure from worker {}", worker),
    }
}

/// Requests work until terminated, clustering each received sample with `kmedoids`.
/// Returns the number of samples processed.
pub fn run_worker<T: Float, E: WorkerEndpoint<T>>(
    endpoint: &E,
    kmedoids: &KMedoids,
    num_clusters: usize,
    num_repeats: usize,
    selector: &mut UniformSelector,
) -> Result<usize> {
    let worker = endpoint.id();
    endpoint.send(ToCoordinator::WorkRequest { worker })?;

    let mut completed = 0;
    loop {
        match endpoint.recv()? {
            ToWorker::Work(sample) => {
                let local = match kmedoids.fit(&sample.points, num_clusters, num_repeats, selector) {
                    Ok(local) => local,
                    Err(err) => {
                        endpoint.send(ToCoordinator::WorkFailed {
                            worker,
                            reason: err.to_string(),
                        })?;
                        return Err(err);
                    }
                };

                endpoint.send(ToCoordinator::WorkResult {
                    worker,
                    medoid_indices: sample.global_indices(&local.medoid_indices),
                    medoids: local.medoids,
                })?;
                completed += 1;
            }
            ToWorker::Terminate => break,
        }
    }

    tracing::trace!(worker, completed, "worker terminated");
    Ok(completed)
}
