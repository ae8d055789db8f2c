// Copyright 2025 the Sable authors
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

//! The implicit-state backend.
//!
//! Mirrors a DX11-style API: bindings resolve into per-stage flat slot
//! arrays, fixed-function state compiles into small deduplicated state
//! blocks, and the command list filters redundant state changes before they
//! reach the device.

pub mod backend;
pub mod command;

pub use backend::{ImmediateBackend, ImmediateBindings, ImmediatePso, SlotBinding, StageSlots};
pub use command::ImmediateCommandList;
