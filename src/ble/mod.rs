//! Companion-app link.
//!
//! The device runs the Nordic SoftDevice S140 in **Peripheral** role and
//! exposes one GATT service with a single read/write/notify characteristic:
//!
//! 1. **Incoming** - every write from the app is a short JSON document,
//!    classified by [`message::classify`].
//! 2. **Outgoing** - the device notifies short text (the `Ready` greeting
//!    after connect).
//!
//! The transport adapter reports connection changes and writes through
//! [`LinkListener`].  Events are queued and drained by the main loop, so the
//! behaviour core never runs inside a radio callback.

pub mod message;

use heapless::{Deque, String};

use crate::config::{LINK_QUEUE_LEN, MAX_MESSAGE_LEN};

/// Event delivered by the transport adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkEvent {
    /// A companion app connected.
    Connected,
    /// The connection was closed (by either side).
    Disconnected,
    /// The app wrote a message.
    Received(String<MAX_MESSAGE_LEN>),
}

#[cfg(feature = "defmt")]
impl defmt::Format for LinkEvent {
    fn format(&self, f: defmt::Formatter) {
        match self {
            LinkEvent::Connected => defmt::write!(f, "Connected"),
            LinkEvent::Disconnected => defmt::write!(f, "Disconnected"),
            LinkEvent::Received(text) => defmt::write!(f, "Received({} bytes)", text.len()),
        }
    }
}

/// Callbacks a transport adapter invokes.
pub trait LinkListener {
    fn on_connect(&mut self);
    fn on_disconnect(&mut self);
    fn on_receive(&mut self, data: &[u8]);
}

/// Build a [`LinkEvent::Received`] from raw characteristic bytes.
///
/// Returns `None` for empty, oversized or non-UTF-8 writes.
pub fn received(data: &[u8]) -> Option<LinkEvent> {
    if data.is_empty() {
        return None;
    }
    let Ok(text) = core::str::from_utf8(data) else {
        warn!("Link: dropping non-UTF-8 write ({} bytes)", data.len());
        return None;
    };
    let mut message = String::new();
    if message.push_str(text).is_err() {
        warn!("Link: dropping oversized write ({} bytes)", data.len());
        return None;
    }
    Some(LinkEvent::Received(message))
}

/// Bounded FIFO of link events, filled by the adapter and drained by the
/// main loop.  When full, the oldest message is discarded; connection
/// changes are never lost.
pub struct LinkInbox {
    events: Deque<LinkEvent, LINK_QUEUE_LEN>,
}

impl Default for LinkInbox {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkInbox {
    pub const fn new() -> Self {
        Self {
            events: Deque::new(),
        }
    }

    pub fn push(&mut self, event: LinkEvent) {
        if self.events.is_full() && !self.evict_oldest_message() {
            if matches!(event, LinkEvent::Received(_)) {
                warn!("Link: inbox full of state changes, dropping message");
                return;
            }
            // Only connection changes queued; they alternate, so the oldest
            // pair cancels out.
            warn!("Link: inbox full, collapsing oldest connect/disconnect pair");
            let _ = self.events.pop_front();
            let _ = self.events.pop_front();
        }
        let _ = self.events.push_back(event);
    }

    /// Remove the oldest `Received` event, keeping the order of the rest.
    fn evict_oldest_message(&mut self) -> bool {
        let mut kept = Deque::new();
        let mut evicted = false;
        while let Some(event) = self.events.pop_front() {
            if !evicted && matches!(event, LinkEvent::Received(_)) {
                evicted = true;
                continue;
            }
            let _ = kept.push_back(event);
        }
        self.events = kept;
        if evicted {
            warn!("Link: inbox full, dropping oldest message");
        }
        evicted
    }

    pub fn pop(&mut self) -> Option<LinkEvent> {
        self.events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl LinkListener for LinkInbox {
    fn on_connect(&mut self) {
        self.push(LinkEvent::Connected);
    }

    fn on_disconnect(&mut self) {
        self.push(LinkEvent::Disconnected);
    }

    fn on_receive(&mut self, data: &[u8]) {
        if let Some(event) = received(data) {
            self.push(event);
        }
    }
}
