use std::{collections::VecDeque, thread, time::Duration};

use crate::{diff::diff, error::UPSError, event::Event, status::UPSStatus, ups::SnapshotProvider};

/// Polls a [`SnapshotProvider`] and yields the changes between consecutive
/// snapshots.
///
/// Nothing is fetched until the first call to `next`, which takes the
/// baseline snapshot and then waits for the first tick. Each tick's events
/// are handed out in full before the next tick starts. A fetch failing with
/// anything other than [`UPSError::Unreachable`] is yielded once and ends
/// the sequence. Dropping the monitor stops it.
pub struct Monitor<P: SnapshotProvider> {
    provider: P,
    poll_every: Duration,
    sleep: Box<dyn FnMut(Duration) + Send>,
    started: bool,
    finished: bool,
    last: Option<UPSStatus>,
    pending: VecDeque<Event>,
}

impl<P: SnapshotProvider> Monitor<P> {
    pub fn new(provider: P, poll_every: Duration) -> Monitor<P> {
        Monitor {
            provider,
            poll_every,
            sleep: Box::new(thread::sleep),
            started: false,
            finished: false,
            last: None,
            pending: VecDeque::new(),
        }
    }

    /// Replace the function used to wait between ticks.
    pub fn with_sleep(mut self, sleep: impl FnMut(Duration) + Send + 'static) -> Monitor<P> {
        self.sleep = Box::new(sleep);
        self
    }

    /// Stop polling. Events already computed for the current tick are dropped.
    pub fn cancel(&mut self) {
        self.finished = true;
        self.pending.clear();
    }

    /// Block until a tick produces events and return all of them.
    ///
    /// Returns an empty batch once the monitor is cancelled.
    pub fn next_batch(&mut self) -> Result<Vec<Event>, UPSError> {
        if !self.pending.is_empty() {
            return Ok(self.pending.drain(..).collect());
        }
        while !self.finished {
            let events = self.tick()?;
            if !events.is_empty() {
                return Ok(events);
            }
        }
        Ok(Vec::new())
    }

    fn fetch(&mut self) -> Result<Option<UPSStatus>, UPSError> {
        match self.provider.fetch() {
            Ok(status) => Ok(Some(status)),
            Err(e) if e.is_unreachable() => Ok(None),
            Err(e) => {
                self.finished = true;
                Err(e)
            }
        }
    }

    fn tick(&mut self) -> Result<Vec<Event>, UPSError> {
        if !self.started {
            self.last = self.fetch()?;
            self.started = true;
            log::debug!("Monitor baseline taken, reachable: {}.", self.last.is_some());
        }

        (self.sleep)(self.poll_every);
        let current = self.fetch()?;
        let events = diff(self.last.as_ref(), current.as_ref());
        log::debug!("Monitor tick produced {} event(s).", events.len());
        self.last = current;
        Ok(events)
    }
}

impl<P: SnapshotProvider> Iterator for Monitor<P> {
    type Item = Result<Event, UPSError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.pending.pop_front() {
            return Some(Ok(event));
        }
        match self.next_batch() {
            Ok(events) => {
                self.pending.extend(events);
                self.pending.pop_front().map(Ok)
            }
            Err(e) => Some(Err(e)),
        }
    }
}
