use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::errors::{ScanError, ScanResult};
use crate::processors::panic_message;
use crate::processors::spsc::{self, SpscReceiver, SpscSender};

type Handler<T> = Box<dyn FnMut(T) + Send>;

/// Hands chunks from a producer thread to one worker thread over an SPSC
/// queue.
///
/// Lifecycle is idle → running → idle: [`start`](Self::start) spawns the
/// worker, [`stop`](Self::stop) joins it and returns the processor to idle,
/// ready for another round. Chunks pushed while idle stay queued and are
/// handled once the worker starts.
pub struct ThreadedChunkProcessor<T: Send + 'static> {
    sender: SpscSender<T>,
    receiver: Option<SpscReceiver<T>>,
    handler: Option<Handler<T>>,
    stop: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<(SpscReceiver<T>, Handler<T>)>>,
}

impl<T: Send + 'static> ThreadedChunkProcessor<T> {
    pub fn new(handler: impl FnMut(T) + Send + 'static) -> Self {
        Self::with_capacity(spsc::DEFAULT_CAPACITY, handler)
    }

    pub fn with_capacity(capacity: usize, handler: impl FnMut(T) + Send + 'static) -> Self {
        let (sender, receiver) = spsc::channel(capacity);
        Self {
            sender,
            receiver: Some(receiver),
            handler: Some(Box::new(handler)),
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Spawns the worker thread; no-op when already running.
    ///
    /// The worker polls the queue until the stop flag is raised, then keeps
    /// draining until the queue is empty, so everything pushed before
    /// [`stop`](Self::stop) is handled.
    pub fn start(&mut self) {
        if self.worker.is_some() {
            return;
        }
        let (mut receiver, mut handler) = match (self.receiver.take(), self.handler.take()) {
            (Some(receiver), Some(handler)) => (receiver, handler),
            _ => return,
        };
        let stop = Arc::clone(&self.stop);

        self.worker = Some(thread::spawn(move || {
            while !stop.load(Ordering::Acquire) {
                match receiver.try_pop() {
                    Some(chunk) => handler(chunk),
                    None => thread::yield_now(),
                }
            }
            while let Some(chunk) = receiver.try_pop() {
                handler(chunk);
            }
            (receiver, handler)
        }));
    }

    /// Enqueues a chunk, spinning while the queue is full.
    ///
    /// The spin is the backpressure mechanism: memory stays bounded by the
    /// queue capacity and the producer simply waits for the worker.
    pub fn push(&mut self, chunk: T) {
        let mut chunk = chunk;
        let mut spins = 0u32;
        loop {
            match self.sender.try_push(chunk) {
                Ok(()) => return,
                Err(back) => {
                    chunk = back;
                    spins = spins.wrapping_add(1);
                    if spins % 64 == 0 {
                        thread::yield_now();
                    } else {
                        std::hint::spin_loop();
                    }
                }
            }
        }
    }

    /// Raises the stop flag, waits for the worker to drain the queue and
    /// exit, and resets the processor to idle.
    pub fn stop(&mut self) -> ScanResult<()> {
        let worker = match self.worker.take() {
            Some(worker) => worker,
            None => return Ok(()),
        };
        self.stop.store(true, Ordering::Release);
        match worker.join() {
            Ok((receiver, handler)) => {
                self.receiver = Some(receiver);
                self.handler = Some(handler);
                self.stop.store(false, Ordering::Release);
                Ok(())
            }
            Err(payload) => Err(ScanError::worker(panic_message(payload.as_ref()))),
        }
    }
}

impl<T: Send + 'static> Drop for ThreadedChunkProcessor<T> {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    #[test]
    fn handles_every_pushed_chunk() {
        let handled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&handled);
        let mut processor =
            ThreadedChunkProcessor::new(move |_chunk: u64| {
                counter.fetch_add(1, Ordering::Relaxed);
            });

        processor.start();
        for i in 0..1000 {
            processor.push(i);
        }
        processor.stop().unwrap();

        assert_eq!(handled.load(Ordering::Relaxed), 1000);
    }

    #[test]
    fn preserves_chunk_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut processor = ThreadedChunkProcessor::with_capacity(8, move |chunk: u64| {
            sink.lock().unwrap().push(chunk);
        });

        processor.start();
        for i in 0..100 {
            processor.push(i);
        }
        processor.stop().unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn does_not_handle_chunks_while_idle() {
        let handled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&handled);
        let mut processor =
            ThreadedChunkProcessor::new(move |_chunk: u64| {
                counter.fetch_add(1, Ordering::Relaxed);
            });

        processor.push(7);
        assert_eq!(handled.load(Ordering::Relaxed), 0);

        // queued chunks are handled once the worker runs
        processor.start();
        processor.stop().unwrap();
        assert_eq!(handled.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn restarts_after_stop() {
        let handled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&handled);
        let mut processor =
            ThreadedChunkProcessor::new(move |_chunk: u64| {
                counter.fetch_add(1, Ordering::Relaxed);
            });

        processor.start();
        processor.push(1);
        processor.stop().unwrap();

        processor.start();
        processor.push(2);
        processor.push(3);
        processor.stop().unwrap();

        assert_eq!(handled.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn reports_a_panicking_handler() {
        let mut processor = ThreadedChunkProcessor::new(|_chunk: u64| {
            panic!("handler exploded");
        });

        processor.start();
        processor.push(1);
        let err = processor.stop().unwrap_err();
        assert!(matches!(err, ScanError::Worker(_)));
        assert!(err.to_string().contains("handler exploded"));
    }
}
