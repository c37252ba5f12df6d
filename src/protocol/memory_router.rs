// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-process message router with retained messages.
//!
//! [`MemoryRouter`] behaves like a broker living in the same process:
//! retained publishes are stored per topic, new subscriptions get the
//! retained state replayed, and every publish is recorded so callers can
//! inspect what the model sent. [`MemoryRouter::reconnect`] plays a broker
//! reconnection: connect listeners first, then the retained replay.
//!
//! Handlers run synchronously on the publishing thread, after the router's
//! internal lock has been released.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use homeui_model::protocol::{MemoryRouter, Message, MessageRouter};
//!
//! let router = MemoryRouter::new();
//! router.publish("/devices/kitchen/meta/name", "Kitchen", true);
//!
//! let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! router
//!     .add_sticky_subscription(
//!         "/devices/+/meta/name",
//!         Arc::new(move |msg: &Message| sink.lock().push(msg.payload.clone())),
//!     )
//!     .unwrap();
//!
//! // Retained state was replayed on subscribe
//! assert_eq!(*seen.lock(), vec!["Kitchen".to_string()]);
//! ```

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::error::ProtocolError;
use crate::topic::{is_valid_pattern, topic_matches};

use super::{ConnectListener, Message, MessageHandler, MessageRouter, matching_handlers};

/// A message that went through [`MemoryRouter::publish`] or
/// [`MessageRouter::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    /// Topic the message was published to.
    pub topic: String,
    /// Message payload.
    pub payload: String,
    /// Whether the message was retained.
    pub retain: bool,
}

#[derive(Default)]
struct RouterState {
    retained: BTreeMap<String, String>,
    subscriptions: Vec<(String, MessageHandler)>,
    connect_listeners: Vec<ConnectListener>,
    published: Vec<PublishedMessage>,
}

/// In-process [`MessageRouter`].
#[derive(Default)]
pub struct MemoryRouter {
    state: Mutex<RouterState>,
}

impl MemoryRouter {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a message to every matching subscription.
    ///
    /// A retained publish replaces the stored payload for the topic; an empty
    /// retained payload deletes it.
    pub fn publish(&self, topic: &str, payload: &str, retain: bool) {
        let handlers = {
            let mut state = self.state.lock();
            if retain {
                if payload.is_empty() {
                    state.retained.remove(topic);
                } else {
                    state.retained.insert(topic.to_string(), payload.to_string());
                }
            }
            state.published.push(PublishedMessage {
                topic: topic.to_string(),
                payload: payload.to_string(),
                retain,
            });
            matching_handlers(&state.subscriptions, topic)
        };

        tracing::trace!(
            topic = %topic,
            payload = %payload,
            handlers = handlers.len(),
            "Routing in-process message"
        );
        let message = Message::new(topic, payload);
        for handler in handlers {
            handler(&message);
        }
    }

    /// Redelivers every retained message to every matching subscription,
    /// the way a broker does after a reconnection.
    pub fn replay(&self) {
        let deliveries: Vec<(Message, Vec<MessageHandler>)> = {
            let state = self.state.lock();
            state
                .retained
                .iter()
                .map(|(topic, payload)| {
                    (
                        Message::new(topic.as_str(), payload.as_str()),
                        matching_handlers(&state.subscriptions, topic),
                    )
                })
                .collect()
        };

        tracing::debug!(topics = deliveries.len(), "Replaying retained messages");
        for (message, handlers) in deliveries {
            for handler in handlers {
                handler(&message);
            }
        }
    }

    /// Simulates a reconnection: runs every connect listener, then replays
    /// the retained messages.
    pub fn reconnect(&self) {
        let listeners = self.state.lock().connect_listeners.clone();
        tracing::debug!(listeners = listeners.len(), "Simulating reconnection");
        for listener in listeners {
            listener();
        }
        self.replay();
    }

    /// Deletes a retained message without delivering anything, as happens
    /// when it is cleared on the broker while the connection is down.
    pub fn forget_retained(&self, topic: &str) -> Option<String> {
        self.state.lock().retained.remove(topic)
    }

    /// Returns the retained payload of a topic.
    #[must_use]
    pub fn retained(&self, topic: &str) -> Option<String> {
        self.state.lock().retained.get(topic).cloned()
    }

    /// Returns every message published so far, oldest first.
    #[must_use]
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.state.lock().published.clone()
    }

    /// Returns the published messages whose topic matches `pattern`.
    #[must_use]
    pub fn published_matching(&self, pattern: &str) -> Vec<PublishedMessage> {
        self.state
            .lock()
            .published
            .iter()
            .filter(|message| topic_matches(pattern, &message.topic))
            .cloned()
            .collect()
    }

    /// Returns the number of subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.state.lock().subscriptions.len()
    }
}

impl MessageRouter for MemoryRouter {
    fn add_sticky_subscription(
        &self,
        pattern: &str,
        handler: MessageHandler,
    ) -> Result<(), ProtocolError> {
        if !is_valid_pattern(pattern) {
            return Err(ProtocolError::InvalidPattern(pattern.to_string()));
        }

        let replay: Vec<Message> = {
            let mut state = self.state.lock();
            state
                .subscriptions
                .push((pattern.to_string(), handler.clone()));
            state
                .retained
                .iter()
                .filter(|(topic, _)| topic_matches(pattern, topic))
                .map(|(topic, payload)| Message::new(topic.as_str(), payload.as_str()))
                .collect()
        };

        tracing::debug!(
            pattern = %pattern,
            retained = replay.len(),
            "Added sticky subscription"
        );
        for message in &replay {
            handler(message);
        }
        Ok(())
    }

    fn send(&self, topic: &str, payload: &str, retain: bool) -> Result<(), ProtocolError> {
        self.publish(topic, payload, retain);
        Ok(())
    }

    fn add_connect_listener(&self, listener: ConnectListener) {
        self.state.lock().connect_listeners.push(listener);
    }
}

impl std::fmt::Debug for MemoryRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MemoryRouter")
            .field("retained", &state.retained.len())
            .field("subscriptions", &state.subscriptions.len())
            .field("connect_listeners", &state.connect_listeners.len())
            .field("published", &state.published.len())
            .finish()
    }
}
