// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for device controls.
//!
//! This module holds the type coercion table: the declared control type
//! ([`CellType`]) decides the [`ValueKind`], which in turn decides how bus
//! payloads become typed [`CellValue`]s and back.
//!
//! # Types
//!
//! - [`CellType`] - Declared control type (`temperature`, `switch`, ...)
//! - [`ValueKind`] - Payload interpretation (string/boolean/number/pushbutton/rgb)
//! - [`CellValue`] - Typed value stored in a cell
//! - [`RgbColor`] - Color with 8-bit channels

mod cell_type;
mod rgb_color;
mod value;

pub use cell_type::CellType;
pub use rgb_color::RgbColor;
pub use value::{CellValue, PUSHBUTTON_TRIGGER, ValueKind, format_number, parse_number};
pub(crate) use value::same_number;
