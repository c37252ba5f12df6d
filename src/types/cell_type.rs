// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Declared control types and the coercion table.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use super::ValueKind;

/// Declared type of a control, as published on `meta/type`.
///
/// Known type names map to a [`ValueKind`] and default display units. Any
/// other name is kept verbatim in [`CellType::Other`] and behaves as a
/// string. [`CellType::Incomplete`] is the sentinel for "no type yet".
///
/// # Examples
///
/// ```
/// use homeui_model::types::{CellType, ValueKind};
///
/// let ty = CellType::from_name("temperature");
/// assert_eq!(ty, CellType::Temperature);
/// assert_eq!(ty.value_kind(), ValueKind::Number);
/// assert_eq!(ty.default_units(), "°C");
///
/// assert_eq!(CellType::from_name(""), CellType::Incomplete);
/// assert_eq!(CellType::from_name("lux").value_kind(), ValueKind::String);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum CellType {
    /// No type received yet, or the type was removed.
    #[default]
    Incomplete,
    /// `text`
    Text,
    /// `switch`
    Switch,
    /// `wo-switch`, a write-only switch.
    WoSwitch,
    /// `alarm`
    Alarm,
    /// `pushbutton`
    Pushbutton,
    /// `temperature`
    Temperature,
    /// `rel_humidity`
    RelHumidity,
    /// `atmospheric_pressure`
    AtmosphericPressure,
    /// `rainfall`
    Rainfall,
    /// `wind_speed`
    WindSpeed,
    /// `power`
    Power,
    /// `power_consumption`
    PowerConsumption,
    /// `voltage`
    Voltage,
    /// `water_flow`
    WaterFlow,
    /// `water_consumption`
    WaterConsumption,
    /// `resistance`
    Resistance,
    /// `concentration`
    Concentration,
    /// `pressure`
    Pressure,
    /// `range`
    Range,
    /// `value`
    Value,
    /// `rgb`
    Rgb,
    /// Any type name not in the table.
    Other(String),
}

impl CellType {
    /// Maps a type name to a cell type. Empty names give [`CellType::Incomplete`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "" | "incomplete" => Self::Incomplete,
            "text" => Self::Text,
            "switch" => Self::Switch,
            "wo-switch" => Self::WoSwitch,
            "alarm" => Self::Alarm,
            "pushbutton" => Self::Pushbutton,
            "temperature" => Self::Temperature,
            "rel_humidity" => Self::RelHumidity,
            "atmospheric_pressure" => Self::AtmosphericPressure,
            "rainfall" => Self::Rainfall,
            "wind_speed" => Self::WindSpeed,
            "power" => Self::Power,
            "power_consumption" => Self::PowerConsumption,
            "voltage" => Self::Voltage,
            "water_flow" => Self::WaterFlow,
            "water_consumption" => Self::WaterConsumption,
            "resistance" => Self::Resistance,
            "concentration" => Self::Concentration,
            "pressure" => Self::Pressure,
            "range" => Self::Range,
            "value" => Self::Value,
            "rgb" => Self::Rgb,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the type name as published on the bus.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Incomplete => "incomplete",
            Self::Text => "text",
            Self::Switch => "switch",
            Self::WoSwitch => "wo-switch",
            Self::Alarm => "alarm",
            Self::Pushbutton => "pushbutton",
            Self::Temperature => "temperature",
            Self::RelHumidity => "rel_humidity",
            Self::AtmosphericPressure => "atmospheric_pressure",
            Self::Rainfall => "rainfall",
            Self::WindSpeed => "wind_speed",
            Self::Power => "power",
            Self::PowerConsumption => "power_consumption",
            Self::Voltage => "voltage",
            Self::WaterFlow => "water_flow",
            Self::WaterConsumption => "water_consumption",
            Self::Resistance => "resistance",
            Self::Concentration => "concentration",
            Self::Pressure => "pressure",
            Self::Range => "range",
            Self::Value => "value",
            Self::Rgb => "rgb",
            Self::Other(name) => name,
        }
    }

    /// Returns `true` for the [`CellType::Incomplete`] sentinel.
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::Incomplete)
    }

    /// Returns the value kind used to decode and encode payloads.
    #[must_use]
    pub fn value_kind(&self) -> ValueKind {
        match self {
            Self::Switch | Self::WoSwitch | Self::Alarm => ValueKind::Boolean,
            Self::Pushbutton => ValueKind::Pushbutton,
            Self::Temperature
            | Self::RelHumidity
            | Self::AtmosphericPressure
            | Self::Rainfall
            | Self::WindSpeed
            | Self::Power
            | Self::PowerConsumption
            | Self::Voltage
            | Self::WaterFlow
            | Self::WaterConsumption
            | Self::Resistance
            | Self::Concentration
            | Self::Pressure
            | Self::Range
            | Self::Value => ValueKind::Number,
            Self::Rgb => ValueKind::Rgb,
            Self::Incomplete | Self::Text | Self::Other(_) => ValueKind::String,
        }
    }

    /// Returns the default display units, empty when the type has none.
    #[must_use]
    pub fn default_units(&self) -> &'static str {
        match self {
            Self::Temperature => "°C",
            Self::RelHumidity => "%, RH",
            Self::AtmosphericPressure => "millibar (100 Pa)",
            Self::Rainfall => "mm/h",
            Self::WindSpeed => "m/s",
            Self::Power => "W",
            Self::PowerConsumption => "kWh",
            Self::Voltage => "V",
            Self::WaterFlow => "m³/h",
            Self::WaterConsumption => "m³",
            Self::Resistance => "Ohm",
            Self::Concentration => "ppm",
            Self::Pressure => "bar",
            _ => "",
        }
    }

    /// Returns `true` for types whose values are free text.
    ///
    /// A textual cell keeps an empty string instead of losing its value when
    /// the value is removed, so it stays complete.
    #[must_use]
    pub fn is_textual(&self) -> bool {
        !self.is_incomplete() && self.value_kind() == ValueKind::String
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CellType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl serde::Serialize for CellType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
