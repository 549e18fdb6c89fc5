//! Cross-thread completion reports
//!
//! Animation drivers that run off the scheduler thread report finished
//! overlays through a [`CompletionSender`]. Reports are queued and applied
//! on the scheduler thread the next time it is called, so lane state is
//! still only ever touched from one thread.

use crossbeam::channel::{unbounded, Receiver, Sender};
use smallvec::SmallVec;

use crate::lifecycle::EntityHandle;

/// Cloneable, thread-safe handle for reporting finished overlays
#[derive(Debug, Clone)]
pub struct CompletionSender {
    tx: Sender<EntityHandle>,
}

impl CompletionSender {
    /// Report that the overlay for `handle` finished animating
    ///
    /// Returns `false` once the scheduler has been dropped.
    pub fn finished(&self, handle: EntityHandle) -> bool {
        self.tx.send(handle).is_ok()
    }
}

#[derive(Debug)]
pub(crate) struct CompletionQueue {
    tx: Sender<EntityHandle>,
    rx: Receiver<EntityHandle>,
}

impl CompletionQueue {
    pub(crate) fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub(crate) fn sender(&self) -> CompletionSender {
        CompletionSender {
            tx: self.tx.clone(),
        }
    }

    pub(crate) fn drain(&self) -> SmallVec<[EntityHandle; 8]> {
        self.rx.try_iter().collect()
    }
}
