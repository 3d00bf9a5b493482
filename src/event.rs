use std::time::Duration;

use crossterm::event::{self as term, KeyEvent, MouseEvent};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::error::{AppError, Result};
use crate::tree::node::{Node, NodeId};

/// Everything the main loop reacts to: terminal input and fetch results.
#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// No input within one tick; the loop redraws.
    Tick,
    Resize(u16, u16),
    /// The root listing arrived.
    InitialLoaded(Result<Vec<Node>>),
    /// A children fetch for `id` finished.
    ChildrenLoaded { id: NodeId, result: Result<Vec<Node>> },
    /// A diff fetch for `id` finished.
    DiffLoaded { id: NodeId, result: Result<Vec<String>> },
}

impl Event {
    fn from_terminal(event: term::Event) -> Option<Self> {
        match event {
            term::Event::Key(key) => Some(Event::Key(key)),
            term::Event::Mouse(mouse) => Some(Event::Mouse(mouse)),
            term::Event::Resize(w, h) => Some(Event::Resize(w, h)),
            _ => None,
        }
    }
}

/// Single queue feeding the main loop. Terminal input is read on a blocking
/// thread; fetch tasks post through `sender()`.
pub struct EventHandler {
    rx: UnboundedReceiver<Event>,
    tx: UnboundedSender<Event>,
}

/// Forward terminal input until the receiving side is gone.
fn read_input(tx: UnboundedSender<Event>, tick_rate: Duration) {
    loop {
        let event = match term::poll(tick_rate) {
            Ok(true) => match term::read() {
                Ok(raw) => Event::from_terminal(raw),
                Err(_) => None,
            },
            Ok(false) => Some(Event::Tick),
            Err(_) => None,
        };
        if let Some(event) = event {
            if tx.send(event).is_err() {
                return;
            }
        } else if tx.is_closed() {
            return;
        }
    }
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let input_tx = tx.clone();
        tokio::task::spawn_blocking(move || read_input(input_tx, tick_rate));
        Self { rx, tx }
    }

    /// Sender for fetch tasks to post their results.
    pub fn sender(&self) -> UnboundedSender<Event> {
        self.tx.clone()
    }

    pub async fn next(&mut self) -> Result<Event> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| AppError::Terminal("event channel closed".into()))
    }
}
