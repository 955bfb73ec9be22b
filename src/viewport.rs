//! Viewport size and resize notifications.
//!
//! Listeners get a channel; the viewport prunes receivers that were dropped,
//! so unsubscribing is simply dropping the receiver.

use std::sync::mpsc::{self, Receiver, Sender};

pub struct Viewport {
    width: u32,
    height: u32,
    listeners: Vec<Sender<(u32, u32)>>,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            listeners: Vec::new(),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Register a resize listener.
    pub fn subscribe(&mut self) -> Receiver<(u32, u32)> {
        let (tx, rx) = mpsc::channel();
        self.listeners.push(tx);
        rx
    }

    /// Publish a new size to every live listener.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.listeners.retain(|tx| tx.send((width, height)).is_ok());
    }

    /// Number of listeners still attached as of the last resize.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

/// Drain pending resize events, keeping only the most recent size.
pub fn latest_size(rx: &Receiver<(u32, u32)>) -> Option<(u32, u32)> {
    rx.try_iter().last()
}
