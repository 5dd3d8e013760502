// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

/// A thread-safe, unbounded event channel.
///
/// Generic over the event type so that the settlement stream and any
/// caller-defined stream share one implementation.
#[derive(Debug)]
pub struct EventBus<T: Clone + Send + Sync + 'static> {
    sender: flume::Sender<T>,
    receiver: flume::Receiver<T>,
}

impl<T: Clone + Send + Sync + 'static> EventBus<T> {
    /// Creates a bus backed by an unbounded channel.
    ///
    /// ## Returns
    /// A new, empty EventBus.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        log::trace!("EventBus initialized.");
        Self { sender, receiver }
    }

    /// Sends an event, logging if every receiver is gone.
    ///
    /// ## Arguments
    /// * `event` - The event to queue on the channel.
    pub fn publish(&self, event: T) {
        if let Err(e) = self.sender.send(event) {
            log::error!("Failed to publish event: {e}. Receiver likely disconnected.");
        }
    }

    /// Returns a clone of the sending half.
    /// Use this for producers living in other tasks.
    ///
    /// ## Returns
    /// A clone of the sender end of the channel.
    pub fn sender(&self) -> flume::Sender<T> {
        self.sender.clone()
    }

    /// Returns the receiving half, for the owner of the bus.
    ///
    /// ## Returns
    /// A reference to the receiver end of the channel.
    pub fn receiver(&self) -> &flume::Receiver<T> {
        &self.receiver
    }

    /// Takes every event queued so far without waiting.
    ///
    /// ## Returns
    /// The queued events in publication order, possibly empty.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }
}

impl<T: Clone + Send + Sync + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::AssetKind;
    use crate::progress::ProgressSnapshot;
    use crate::settlement::{Outcome, SettlePath, Settlement, SettlementEvent};
    use std::{thread, time::Duration};

    fn settled(id: &str, outcome: Outcome) -> SettlementEvent {
        SettlementEvent {
            settlement: Settlement {
                kind: AssetKind::Image,
                id: id.to_string(),
                outcome,
                path: SettlePath::Event,
                elapsed: Duration::from_millis(12),
            },
            snapshot: ProgressSnapshot::default(),
        }
    }

    #[test]
    fn new_bus_is_empty() {
        let bus = EventBus::<SettlementEvent>::new();
        assert!(bus.receiver().is_empty());
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn events_arrive_in_publish_order() {
        let bus = EventBus::<SettlementEvent>::new();
        bus.publish(settled("a.png", Outcome::Loaded));
        bus.publish(settled("b.png", Outcome::Failed));

        let ids: Vec<_> = bus
            .drain()
            .into_iter()
            .map(|event| event.settlement.id)
            .collect();
        assert_eq!(ids, vec!["a.png", "b.png"]);
    }

    #[test]
    fn senders_work_from_other_threads() {
        let bus = EventBus::<SettlementEvent>::new();
        let sender = bus.sender();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            sender
                .send(settled("late.png", Outcome::Loaded))
                .expect("Send from thread failed");
        });

        let event = bus
            .receiver()
            .recv_timeout(Duration::from_secs(1))
            .expect("event should arrive");
        assert_eq!(event.settlement.id, "late.png");
        handle.join().expect("Thread join failed");
    }

    #[test]
    fn sending_after_drop_fails() {
        let bus = EventBus::<SettlementEvent>::new();
        let sender = bus.sender();
        drop(bus);

        assert!(sender.send(settled("orphan.png", Outcome::Failed)).is_err());
    }
}
