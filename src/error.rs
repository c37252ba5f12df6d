// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `homeui_model` library.
//!
//! Registry failures (malformed topics, invalid cell ids, strict lookups of
//! unknown cells) and transport failures share a single [`Error`] enum.
//! Writes that are refused by a cell (incomplete, read-only) are not errors
//! and never show up here.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The topic does not have the `/devices/<dev>/controls/<ctrl>` shape.
    #[error("malformed topic: {0}")]
    MalformedTopic(String),

    /// A cell id is not made of exactly two non-empty segments.
    #[error("invalid cell id: {0}")]
    InvalidCellId(String),

    /// Strict lookup of a cell that is not in the registry.
    #[error("cell not found: {0}")]
    NotFound(String),

    /// Error occurred while talking to the message router.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Errors related to the message router (in-process or MQTT).
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// MQTT client request could not be queued.
    #[cfg(feature = "mqtt")]
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Connection to the broker failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Invalid broker address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Subscription pattern is not a valid topic filter.
    #[error("invalid topic pattern: {0}")]
    InvalidPattern(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
