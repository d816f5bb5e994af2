use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use decoder::event::Event;

use crate::EventSink;

/// Message carried on the sink queue. `Shutdown` is the explicit sentinel
/// the decoder enqueues once capture ends; unlike a bare `None` it can't be
/// confused with "no event yet" in a typed channel.
pub enum SinkMessage {
    Event(Event),
    Shutdown,
}

/// Runs a fixed set of sinks on a dedicated thread, fed by an MPSC queue.
/// File and network I/O happen here, never on the decoder thread.
pub struct SinkWorker {
    sender: Sender<SinkMessage>,
    handle: Option<JoinHandle<()>>,
}

impl SinkWorker {
    pub fn spawn(mut sinks: Vec<Box<dyn EventSink>>) -> Self {
        let (sender, receiver): (Sender<SinkMessage>, Receiver<SinkMessage>) = mpsc::channel();
        let handle = thread::spawn(move || {
            for message in receiver {
                match message {
                    SinkMessage::Event(event) => {
                        for sink in sinks.iter_mut() {
                            sink.handle(&event);
                        }
                    }
                    SinkMessage::Shutdown => break,
                }
            }
            for sink in sinks.iter_mut() {
                sink.flush();
            }
        });
        SinkWorker {
            sender,
            handle: Some(handle),
        }
    }

    pub fn sender(&self) -> Sender<SinkMessage> {
        self.sender.clone()
    }

    pub fn submit(&self, event: Event) {
        if self.sender.send(SinkMessage::Event(event)).is_err() {
            tracing::warn!("sink worker: queue closed, dropping event");
        }
    }

    /// Enqueues the shutdown sentinel and blocks until the worker thread has
    /// drained the queue and flushed every sink.
    pub fn shutdown(mut self) {
        let _ = self.sender.send(SinkMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SinkWorker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.sender.send(SinkMessage::Shutdown);
            let _ = handle.join();
        }
    }
}
