//! The render worker pool.
//!
//! Long-lived threads fed row jobs through a channel; no work
//! stealing, because frame completion order matters. The per-frame
//! protocol is a counted barrier:
//!
//! 1. the coordinator sends one [`Job::Row`] per dirty row,
//! 2. every worker acknowledges each row it *finishes* on the done
//!    channel,
//! 3. the coordinator waits for exactly as many acknowledgments as
//!    rows it posted before touching the buffer again.
//!
//! Counting completed rows (not idle workers) is what makes the
//! barrier sound: the job channel is MPMC, so any scheme that counts
//! per-worker sentinels can be satisfied by one idle worker draining
//! them while another is still painting. An ack tied to each finished
//! row bounds every write.
//!
//! [`Job::Terminate`] makes a worker exit; the pool joins them on
//! drop.

use crate::rowpaint::{render_row, FrameShared, RowJob};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

pub enum Job {
    Row {
        shared: Arc<FrameShared>,
        job: RowJob,
    },
    Terminate,
}

pub struct WorkerPool {
    jobs: Sender<Job>,
    done: Receiver<()>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `count` workers. Zero is valid: the coordinator then
    /// renders rows inline.
    pub fn new(count: usize) -> Self {
        let (jobs, job_rx) = unbounded::<Job>();
        let (done_tx, done) = unbounded::<()>();

        let handles = (0..count)
            .map(|id| {
                let rx = job_rx.clone();
                let done = done_tx.clone();
                std::thread::Builder::new()
                    .name(format!("render:{id}"))
                    .spawn(move || worker_loop(rx, done))
                    .expect("spawning render worker")
            })
            .collect();

        tracing::debug!(target: "render.workers", count, "worker pool up");
        WorkerPool {
            jobs,
            done,
            handles,
        }
    }

    pub fn count(&self) -> usize {
        self.handles.len()
    }

    pub fn send(&self, job: Job) {
        // Workers only stop when we send Terminate, so the channel
        // cannot be disconnected while the pool is alive.
        self.jobs.send(job).expect("worker pool alive");
    }

    /// Barrier: wait until `posted` row jobs have been acknowledged as
    /// *completed*. Only after this returns is the frame buffer free
    /// of worker writes.
    pub fn rendezvous(&self, posted: usize) {
        for _ in 0..posted {
            self.done.recv().expect("worker acknowledged row");
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        for _ in 0..self.handles.len() {
            let _ = self.jobs.send(Job::Terminate);
        }
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

fn worker_loop(jobs: Receiver<Job>, done: Sender<()>) {
    while let Ok(job) = jobs.recv() {
        match job {
            Job::Row { shared, job } => {
                // SAFETY: the coordinator hands each row out once and
                // holds the frame alive until every posted row has
                // been acknowledged below.
                unsafe { render_row(&shared, &job) };
                // Ack strictly after the row's writes are finished.
                let _ = done.send(());
            }
            Job::Terminate => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_starts_and_terminates() {
        let pool = WorkerPool::new(3);
        assert_eq!(pool.count(), 3);
        pool.rendezvous(0); // empty frame
        drop(pool); // joins cleanly
    }

    #[test]
    fn zero_workers_is_inline_mode() {
        let pool = WorkerPool::new(0);
        assert_eq!(pool.count(), 0);
        pool.rendezvous(0);
    }

    #[test]
    fn empty_frames_never_block() {
        let pool = WorkerPool::new(2);
        for _ in 0..5 {
            pool.rendezvous(0);
        }
    }
}
