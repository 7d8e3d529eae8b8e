//! In-memory link between two sessions in the same process
//!
//! Bytes sent on one end become visible on the other end a fixed number of
//! ticks later, in order. Time only moves when the host advances the shared
//! [`LoopbackClock`].

use crate::{Transport, TransportError};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// Tick counter shared by both ends of a loopback link
#[derive(Debug, Clone, Default)]
pub struct LoopbackClock(Rc<Cell<u64>>);

impl LoopbackClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.0.get()
    }

    pub fn advance(&self) {
        self.0.set(self.0.get() + 1);
    }
}

#[derive(Debug, Default)]
struct Channel {
    in_flight: VecDeque<(u64, Vec<u8>)>,
    closed: bool,
}

type SharedChannel = Rc<RefCell<Channel>>;

pub struct LoopbackTransport {
    clock: LoopbackClock,
    latency_ticks: u64,
    outbound: SharedChannel,
    inbound: SharedChannel,
}

/// Two connected ends with `latency_ticks` of one-way delay
pub fn loopback_pair(
    clock: &LoopbackClock,
    latency_ticks: u64,
) -> (LoopbackTransport, LoopbackTransport) {
    let a_to_b = SharedChannel::default();
    let b_to_a = SharedChannel::default();
    let a = LoopbackTransport {
        clock: clock.clone(),
        latency_ticks,
        outbound: a_to_b.clone(),
        inbound: b_to_a.clone(),
    };
    let b = LoopbackTransport {
        clock: clock.clone(),
        latency_ticks,
        outbound: b_to_a,
        inbound: a_to_b,
    };
    (a, b)
}

impl LoopbackTransport {
    pub fn latency_ticks(&self) -> u64 {
        self.latency_ticks
    }

    /// Close both directions; later sends on either end fail
    pub fn close(&mut self) {
        self.outbound.borrow_mut().closed = true;
        self.inbound.borrow_mut().closed = true;
    }

    /// Bytes sent by this end that the peer has not polled yet
    pub fn in_flight(&self) -> usize {
        self.outbound
            .borrow()
            .in_flight
            .iter()
            .map(|(_, bytes)| bytes.len())
            .sum()
    }
}

impl Transport for LoopbackTransport {
    fn poll(&mut self) -> Option<Vec<u8>> {
        let now = self.clock.now();
        let mut inbound = self.inbound.borrow_mut();
        let mut delivered: Option<Vec<u8>> = None;
        while let Some(due) = inbound.in_flight.front().map(|(due, _)| *due) {
            if due > now {
                break;
            }
            if let Some((_, bytes)) = inbound.in_flight.pop_front() {
                delivered.get_or_insert_with(Vec::new).extend(bytes);
            }
        }
        delivered
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut outbound = self.outbound.borrow_mut();
        if outbound.closed {
            return Err(TransportError::Closed);
        }
        let due = self.clock.now() + self.latency_ticks;
        outbound.in_flight.push_back((due, bytes.to_vec()));
        Ok(())
    }
}
