// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT broker connection implementing [`MessageRouter`].
//!
//! Sticky subscriptions map onto MQTT retained messages: every pattern is
//! subscribed on the broker, and the broker delivers the retained payload of
//! each matching topic right after the subscription. On every later
//! `ConnAck` the connect listeners run first, then the patterns are
//! re-subscribed, so a reconnection rebuilds the model from the retained
//! state.
//!
//! # Examples
//!
//! ```no_run
//! use homeui_model::protocol::MqttRouter;
//!
//! # async fn example() -> homeui_model::Result<()> {
//! let router = MqttRouter::builder()
//!     .host("192.168.1.50")
//!     .port(1883)
//!     .credentials("user", "password")
//!     .build()
//!     .await?;
//!
//! if router.is_connected() {
//!     println!("Connected to MQTT broker");
//! }
//!
//! router.disconnect()?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS};
use tokio::sync::oneshot;

use crate::error::ProtocolError;
use crate::topic::is_valid_pattern;

use super::{ConnectListener, Message, MessageHandler, MessageRouter, matching_handlers};

/// Global counter for generating unique client IDs.
static ROUTER_CLIENT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Configuration for an MQTT router connection.
#[derive(Debug, Clone)]
pub struct MqttRouterConfig {
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
    client_id: Option<String>,
    keep_alive: Duration,
    connection_timeout: Duration,
    reconnect_delay: Duration,
    channel_capacity: usize,
}

impl Default for MqttRouterConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 1883,
            credentials: None,
            client_id: None,
            keep_alive: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
            reconnect_delay: Duration::from_secs(5),
            channel_capacity: 64,
        }
    }
}

impl MqttRouterConfig {
    /// Returns the broker host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the broker port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the delay between reconnection attempts.
    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }
}

/// A [`MessageRouter`] backed by an MQTT broker.
///
/// `MqttRouter` is cheaply cloneable (via `Arc`). The connection is driven by
/// a background task spawned in [`MqttRouterBuilder::build`].
#[derive(Clone)]
pub struct MqttRouter {
    inner: Arc<MqttRouterInner>,
}

struct MqttRouterInner {
    /// The MQTT async client for publishing and subscribing.
    client: AsyncClient,
    /// Sticky subscriptions, in registration order.
    subscriptions: RwLock<Vec<(String, MessageHandler)>>,
    connect_listeners: RwLock<Vec<ConnectListener>>,
    config: MqttRouterConfig,
    connected: AtomicBool,
    /// Set by [`MqttRouter::disconnect`] to stop the event loop.
    shutdown: AtomicBool,
}

impl MqttRouter {
    /// Creates a new builder for configuring an MQTT router.
    #[must_use]
    pub fn builder() -> MqttRouterBuilder {
        MqttRouterBuilder::default()
    }

    /// Returns whether the broker connection is currently up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    /// Returns the configuration used for this connection.
    #[must_use]
    pub fn config(&self) -> &MqttRouterConfig {
        &self.inner.config
    }

    /// Returns the number of sticky subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.inner.subscriptions.read().len()
    }

    /// Disconnects from the broker and stops the event loop.
    ///
    /// # Errors
    ///
    /// Returns error if the disconnect request cannot be queued.
    pub fn disconnect(&self) -> Result<(), ProtocolError> {
        tracing::info!(
            host = %self.inner.config.host,
            port = %self.inner.config.port,
            "Disconnecting from MQTT broker"
        );

        self.inner.shutdown.store(true, Ordering::Release);
        self.inner.subscriptions.write().clear();
        self.inner.connect_listeners.write().clear();
        self.inner.client.try_disconnect()?;
        self.inner.connected.store(false, Ordering::Release);
        Ok(())
    }

    /// Runs every connect listener.
    fn notify_connected(&self) {
        let listeners = self.inner.connect_listeners.read().clone();
        for listener in listeners {
            listener();
        }
    }

    /// Issues broker subscriptions for every registered pattern.
    fn resubscribe_all(&self) {
        let patterns: Vec<String> = self
            .inner
            .subscriptions
            .read()
            .iter()
            .map(|(pattern, _)| pattern.clone())
            .collect();

        for pattern in patterns {
            if let Err(e) = self.inner.client.try_subscribe(&pattern, QoS::AtLeastOnce) {
                tracing::warn!(pattern = %pattern, error = %e, "Failed to resubscribe");
            }
        }
    }

    /// Routes an incoming publish to every matching handler.
    fn route_message(&self, message: &Message) {
        let handlers = matching_handlers(&self.inner.subscriptions.read(), &message.topic);
        for handler in handlers {
            handler(message);
        }
    }
}

impl MessageRouter for MqttRouter {
    fn add_sticky_subscription(
        &self,
        pattern: &str,
        handler: MessageHandler,
    ) -> Result<(), ProtocolError> {
        if !is_valid_pattern(pattern) {
            return Err(ProtocolError::InvalidPattern(pattern.to_string()));
        }

        self.inner
            .subscriptions
            .write()
            .push((pattern.to_string(), handler));

        // While disconnected the next ConnAck subscribes it.
        if self.is_connected() {
            self.inner.client.try_subscribe(pattern, QoS::AtLeastOnce)?;
        }

        tracing::debug!(pattern = %pattern, "Subscribed to pattern");
        Ok(())
    }

    fn send(&self, topic: &str, payload: &str, retain: bool) -> Result<(), ProtocolError> {
        tracing::debug!(topic = %topic, payload = %payload, retain, "Publishing message");
        self.inner
            .client
            .try_publish(topic, QoS::AtLeastOnce, retain, payload.as_bytes().to_vec())?;
        Ok(())
    }

    fn add_connect_listener(&self, listener: ConnectListener) {
        self.inner.connect_listeners.write().push(listener);
    }
}

impl std::fmt::Debug for MqttRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttRouter")
            .field("host", &self.inner.config.host)
            .field("port", &self.inner.config.port)
            .field("connected", &self.is_connected())
            .field("subscriptions", &self.subscription_count())
            .finish()
    }
}

/// Builder for creating an MQTT router.
///
/// # Examples
///
/// ```no_run
/// use homeui_model::protocol::MqttRouter;
/// use std::time::Duration;
///
/// # async fn example() -> homeui_model::Result<()> {
/// let router = MqttRouter::builder()
///     .host("192.168.1.50")
///     .client_id("homeui-panel")
///     .keep_alive(Duration::from_secs(60))
///     .reconnect_delay(Duration::from_secs(2))
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MqttRouterBuilder {
    config: MqttRouterConfig,
}

impl MqttRouterBuilder {
    /// Sets the broker host address.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the broker port (default: 1883).
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets authentication credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the MQTT client id (default: `homeui_<pid>_<n>`).
    #[must_use]
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.config.client_id = Some(client_id.into());
        self
    }

    /// Sets the keep-alive interval (default: 30 seconds).
    #[must_use]
    pub fn keep_alive(mut self, duration: Duration) -> Self {
        self.config.keep_alive = duration;
        self
    }

    /// Sets the connection timeout (default: 10 seconds).
    #[must_use]
    pub fn connection_timeout(mut self, duration: Duration) -> Self {
        self.config.connection_timeout = duration;
        self
    }

    /// Sets the delay between reconnection attempts (default: 5 seconds).
    #[must_use]
    pub fn reconnect_delay(mut self, duration: Duration) -> Self {
        self.config.reconnect_delay = duration;
        self
    }

    /// Sets the request channel capacity of the MQTT client (default: 64).
    #[must_use]
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.config.channel_capacity = capacity.max(1);
        self
    }

    /// Builds the router and waits for the first broker connection.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Host is not set
    /// - Connection fails
    /// - Connection times out
    pub async fn build(self) -> Result<MqttRouter, ProtocolError> {
        if self.config.host.is_empty() {
            return Err(ProtocolError::InvalidAddress(
                "MQTT broker host is required".to_string(),
            ));
        }

        let client_id = self.config.client_id.clone().unwrap_or_else(|| {
            let counter = ROUTER_CLIENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
            format!("homeui_{}_{}", std::process::id(), counter)
        });

        let mut mqtt_options = MqttOptions::new(&client_id, &self.config.host, self.config.port);
        mqtt_options.set_keep_alive(self.config.keep_alive);
        mqtt_options.set_clean_session(true);

        if let Some((ref username, ref password)) = self.config.credentials {
            mqtt_options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, self.config.channel_capacity);

        let router = MqttRouter {
            inner: Arc::new(MqttRouterInner {
                client,
                subscriptions: RwLock::new(Vec::new()),
                connect_listeners: RwLock::new(Vec::new()),
                config: self.config.clone(),
                connected: AtomicBool::new(false),
                shutdown: AtomicBool::new(false),
            }),
        };

        let router_clone = router.clone();
        let (connack_tx, connack_rx) = oneshot::channel();

        tokio::spawn(async move {
            handle_router_events(event_loop, router_clone, connack_tx).await;
        });

        let timeout = self.config.connection_timeout;
        match tokio::time::timeout(timeout, connack_rx).await {
            Ok(Ok(())) => {
                tracing::info!(
                    host = %self.config.host,
                    port = %self.config.port,
                    client_id = %client_id,
                    "Connected to MQTT broker"
                );
                Ok(router)
            }
            Ok(Err(_)) => Err(ProtocolError::ConnectionFailed(
                "MQTT event loop terminated unexpectedly".to_string(),
            )),
            Err(_) => {
                router.inner.shutdown.store(true, Ordering::Release);
                Err(ProtocolError::ConnectionFailed(format!(
                    "MQTT connection timeout after {}s",
                    timeout.as_secs()
                )))
            }
        }
    }
}

/// Drives the MQTT event loop for a router.
///
/// Errors before the first `ConnAck` end the loop so that `build` fails.
/// Later errors are logged and the loop retries after the reconnect delay.
async fn handle_router_events(
    mut event_loop: EventLoop,
    router: MqttRouter,
    connack_tx: oneshot::Sender<()>,
) {
    use rumqttc::{Event, Packet};

    let mut connack_tx = Some(connack_tx);

    loop {
        if router.inner.shutdown.load(Ordering::Acquire) {
            break;
        }

        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, "MQTT broker connected");
                router.inner.connected.store(true, Ordering::Release);
                router.notify_connected();
                router.resubscribe_all();
                if let Some(tx) = connack_tx.take() {
                    let _ = tx.send(());
                }
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                tracing::debug!(?suback, "MQTT subscription acknowledged");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let Ok(payload) = String::from_utf8(publish.payload.to_vec()) else {
                    tracing::warn!(topic = %publish.topic, "Ignoring non UTF-8 payload");
                    continue;
                };
                tracing::trace!(
                    topic = %publish.topic,
                    payload = %payload,
                    retain = publish.retain,
                    "MQTT message received"
                );
                router.route_message(&Message::new(publish.topic, payload));
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                tracing::info!("MQTT broker disconnected");
                router.inner.connected.store(false, Ordering::Release);
            }
            Ok(_) => {}
            Err(e) => {
                router.inner.connected.store(false, Ordering::Release);
                if connack_tx.is_some() || router.inner.shutdown.load(Ordering::Acquire) {
                    tracing::error!(error = %e, "MQTT router event loop error");
                    break;
                }
                let delay = router.inner.config.reconnect_delay;
                tracing::warn!(
                    error = %e,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "MQTT connection lost, reconnecting"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
