//! An off-thread decode pool: hands decode jobs to a fixed set of worker
//! threads so a caller with many `.kod` payloads doesn't pay decode cost on
//! its own thread, per spec section 5/6.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use crate::binary::{decode_sync, DecodeOptions};
use crate::error::{DecodeError, DecodeErrorKind, DecodeResult};
use crate::value::Value;

struct Job {
    bytes: Vec<u8>,
    options: DecodeOptions,
    respond: mpsc::Sender<DecodeResult<Value>>,
}

/// A handle to one in-flight decode. Dropping it without calling
/// [`DecodeTask::wait`] discards the result when it arrives.
pub struct DecodeTask {
    receiver: mpsc::Receiver<DecodeResult<Value>>,
}

impl DecodeTask {
    /// Block until the worker thread finishes this job.
    ///
    /// Returns a [`DecodeErrorKind::PoolClosed`]-kinded error if the pool
    /// was destroyed before picking up this job.
    pub fn wait(self) -> DecodeResult<Value> {
        self.receiver
            .recv()
            .unwrap_or_else(|_| Err(DecodeError::new(DecodeErrorKind::PoolClosed, 0)))
    }
}

/// A fixed-size pool of worker threads, each pulling decode jobs off a
/// shared queue. Shared state is limited to that queue and each job's
/// single-slot result channel; no locks, caches, or other coordination.
pub struct DecoderPool {
    sender: Option<mpsc::Sender<Job>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl DecoderPool {
    /// Spawn `pool_size` worker threads. `pool_size` is clamped to at least 1.
    pub fn new(pool_size: usize) -> Self {
        let pool_size = pool_size.max(1);
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(std::sync::Mutex::new(receiver));

        let workers = (0..pool_size)
            .map(|_| {
                let receiver = Arc::clone(&receiver);
                thread::spawn(move || loop {
                    let job = {
                        let receiver = receiver.lock().expect("pool worker mutex poisoned");
                        receiver.recv()
                    };
                    match job {
                        Ok(job) => {
                            let result = decode_sync(&job.bytes, job.options);
                            let _ = job.respond.send(result);
                        }
                        Err(_) => break,
                    }
                })
            })
            .collect();

        DecoderPool {
            sender: Some(sender),
            workers,
        }
    }

    /// Submit `bytes` for decoding on a worker thread and return a handle
    /// to the eventual result.
    ///
    /// If the pool has already been [`destroy`][DecoderPool::destroy]ed,
    /// the returned task resolves immediately to a `PoolClosed` error
    /// rather than silently queuing.
    pub fn decode(&self, bytes: Vec<u8>, options: DecodeOptions) -> DecodeTask {
        let (respond, receiver) = mpsc::channel();
        match &self.sender {
            Some(sender) => {
                let job = Job {
                    bytes,
                    options,
                    respond,
                };
                if sender.send(job).is_err() {
                    // Workers are gone even though we haven't called destroy();
                    // treat it the same as a closed pool.
                }
            }
            None => {
                let _ = respond.send(Err(DecodeError::new(DecodeErrorKind::PoolClosed, 0)));
            }
        }
        DecodeTask { receiver }
    }

    /// Close the job queue and join every worker thread, letting any jobs
    /// already queued finish first. Calls to [`decode`][DecoderPool::decode]
    /// made after this returns fail immediately with `PoolClosed`.
    pub fn destroy(mut self) {
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl Drop for DecoderPool {
    fn drop(&mut self) {
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}
