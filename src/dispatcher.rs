use std::io;

use crate::channel::BlockingSender;
use crate::worker::Record;

/// What the dispatcher did before it stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    /// Records handed to the workers
    pub records: u64,
    /// Sends that had to wait for a full work queue
    pub blocked: u64,
    /// Whether reading stopped on an error rather than end of input
    pub read_error: bool,
}

/// Number every line in arrival order and hand it to the worker pool.
///
/// A read error ends the input: records already sent are still processed.
/// Dispatch also stops if no worker is left to receive.
pub fn dispatch<I>(lines: I, work: &BlockingSender<Record>) -> DispatchReport
where
    I: IntoIterator<Item = io::Result<String>>,
{
    let mut sequence = 0;
    let mut read_error = false;

    for line in lines {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::warn!("Error reading input after {sequence} lines, treating it as end of input: {e}");
                read_error = true;
                break;
            }
        };

        if work.send(Record::new(sequence, line)).is_err() {
            log::warn!("Worker pool stopped accepting lines after {sequence} lines");
            break;
        }
        sequence += 1;
    }

    DispatchReport {
        records: sequence,
        blocked: work.block_count(),
        read_error,
    }
}
