use std::sync::mpsc::{self, Receiver, Sender};

/// One event on the output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// A step wrote this value to OUT.
    Emitted(i32),
    /// No valid output: published on resets and step-back.
    Silent,
}

/// A value holder with subscriber notification.
///
/// Keeps the latest value and one channel per subscriber. Each publish
/// replaces the value and sends a clone to every live subscriber.
/// Subscribers whose receiver was dropped are pruned on the next publish.
pub struct Observable<T: Clone> {
    value: T,
    subscribers: Vec<Sender<T>>,
}

impl<T: Clone> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            subscribers: Vec::new(),
        }
    }

    pub fn get(&self) -> T {
        self.value.clone()
    }

    /// Borrow the current value without cloning.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Register a subscriber. The current value is delivered immediately.
    pub fn subscribe(&mut self) -> Receiver<T> {
        let (tx, rx) = mpsc::channel();
        // The receiver is alive here, so this send cannot fail.
        let _ = tx.send(self.value.clone());
        self.subscribers.push(tx);
        rx
    }

    pub fn publish(&mut self, value: T) {
        self.value = value;
        let current = &self.value;
        self.subscribers.retain(|tx| tx.send(current.clone()).is_ok());
    }

    /// Live subscriber count as of the last publish.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
