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

//! The explicit-binding backend.
//!
//! Mirrors a DX12-style API: resource layouts compile into root signatures,
//! resource sets resolve into contiguous descriptor blocks on a simulated
//! heap, and pipelines are single immutable objects embedding all
//! fixed-function state.

pub mod backend;
pub mod command;
pub mod descriptors;
pub mod root_signature;

pub use backend::{ExplicitBackend, ExplicitBindings, ExplicitLayout, ExplicitPso};
pub use command::ExplicitCommandList;
pub use descriptors::{DescriptorBlock, DescriptorHeap, ViewDescriptor};
pub use root_signature::{
    DescriptorRange, DescriptorRangeKind, RootParameter, RootSignature, StaticSamplerDesc,
};
