use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{Result, StatsError};

/// A message on a fan-in channel: either a payload or a producer's last word
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message<T> {
    /// A result from a producer
    Item(T),
    /// The producer will send nothing more
    Done,
}

/// Sending half of a bounded channel that counts how often it had to wait
#[derive(Debug)]
pub struct BlockingSender<T> {
    inner: Sender<T>,
    block_count: Arc<AtomicU64>,
}

impl<T> Clone for BlockingSender<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            block_count: Arc::clone(&self.block_count),
        }
    }
}

/// Create a bounded channel with a block-counting sender
pub fn bounded<T>(capacity: usize) -> (BlockingSender<T>, Receiver<T>) {
    let (tx, rx) = channel::bounded(capacity);
    let sender = BlockingSender {
        inner: tx,
        block_count: Arc::new(AtomicU64::new(0)),
    };
    (sender, rx)
}

impl<T> BlockingSender<T> {
    /// Send an item, blocking while the channel is full.
    ///
    /// Gives the item back if every receiver is gone.
    pub fn send(&self, item: T) -> std::result::Result<(), T> {
        match self.inner.try_send(item) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(item)) => {
                self.block_count.fetch_add(1, Ordering::Relaxed);
                self.inner.send(item).map_err(|e| e.into_inner())
            }
            Err(TrySendError::Disconnected(item)) => Err(item),
        }
    }

    /// Number of sends that found the channel full, across all clones
    pub fn block_count(&self) -> u64 {
        self.block_count.load(Ordering::Relaxed)
    }
}

impl<T> BlockingSender<Message<T>> {
    /// Send a payload to the named stage
    pub fn send_item(&self, stage: &'static str, item: T) -> Result<()> {
        self.send(Message::Item(item))
            .map_err(|_| StatsError::Disconnected(stage))
    }

    /// Tell the named stage this producer is finished
    pub fn finish(&self, stage: &'static str) -> Result<()> {
        self.send(Message::Done)
            .map_err(|_| StatsError::Disconnected(stage))
    }
}

/// Receive payloads until `producers` terminal messages have arrived.
///
/// Every payload goes through `handle`; its first error stops the drain.
/// Returns the number of payloads handled.
///
/// # Errors
///
/// Returns [`StatsError::IncompleteShutdown`] if every sender is dropped
/// before all producers sent [`Message::Done`].
pub fn drain_until_done<T, F>(
    stage: &'static str,
    input: &Receiver<Message<T>>,
    producers: usize,
    mut handle: F,
) -> Result<u64>
where
    F: FnMut(T) -> Result<()>,
{
    let mut finished = 0;
    let mut handled = 0;
    while finished < producers {
        match input.recv() {
            Ok(Message::Item(item)) => {
                handle(item)?;
                handled += 1;
            }
            Ok(Message::Done) => finished += 1,
            Err(_) => {
                return Err(StatsError::IncompleteShutdown {
                    stage,
                    received: finished,
                    expected: producers,
                })
            }
        }
    }
    Ok(handled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_send_receive() {
        let (tx, rx) = bounded(4);
        assert!(tx.send(42).is_ok());
        assert_eq!(rx.recv(), Ok(42));
        assert_eq!(tx.block_count(), 0);
    }

    #[test]
    fn test_block_count() {
        let (tx, rx) = bounded(1);
        tx.send(1).unwrap();
        assert!(rx.is_full());
        assert_eq!(tx.block_count(), 0);

        let blocked = tx.clone();
        let handle = thread::spawn(move || blocked.send(2));

        // The second send finds the channel full and waits for a slot.
        let deadline = Instant::now() + Duration::from_secs(10);
        while tx.block_count() == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(tx.block_count(), 1);

        assert_eq!(rx.recv(), Ok(1));
        handle.join().unwrap().unwrap();
        assert_eq!(rx.recv(), Ok(2));
        assert_eq!(tx.block_count(), 1);
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (tx, rx) = bounded::<u8>(2);
        drop(rx);
        assert_eq!(tx.send(7), Err(7));
        let (tx, rx) = bounded::<Message<u8>>(2);
        drop(rx);
        assert!(matches!(
            tx.send_item("median", 1),
            Err(StatsError::Disconnected("median"))
        ));
    }

    #[test]
    fn test_drain_counts_producers() {
        let (tx, rx) = bounded::<Message<u64>>(16);
        let producers: Vec<_> = (0..3u64)
            .map(|id| {
                let tx = tx.clone();
                thread::spawn(move || {
                    tx.send_item("sum", id).unwrap();
                    tx.send_item("sum", id * 10).unwrap();
                    tx.finish("sum").unwrap();
                })
            })
            .collect();

        let mut sum = 0;
        let handled = drain_until_done("sum", &rx, 3, |v| {
            sum += v;
            Ok(())
        })
        .unwrap();

        for p in producers {
            p.join().unwrap();
        }
        assert_eq!(handled, 6);
        assert_eq!(sum, 33);
    }

    #[test]
    fn test_drain_detects_missing_producer() {
        let (tx, rx) = bounded::<Message<u32>>(4);
        tx.send_item("sum", 1).unwrap();
        tx.finish("sum").unwrap();
        drop(tx);

        let err = drain_until_done("sum", &rx, 2, |_: u32| Ok(())).unwrap_err();
        assert!(matches!(
            err,
            StatsError::IncompleteShutdown {
                received: 1,
                expected: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_drain_stops_on_handler_error() {
        let (tx, rx) = bounded::<Message<u8>>(4);
        tx.send_item("x", 1).unwrap();
        tx.finish("x").unwrap();
        let result = drain_until_done("x", &rx, 1, |_: u8| {
            Err(StatsError::SequenceError("boom".into()))
        });
        assert!(matches!(result, Err(StatsError::SequenceError(_))));
    }
}
