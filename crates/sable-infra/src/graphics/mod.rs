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

//! Graphics backend implementations and the device context.
//!
//! Two backends implement the [`PipelineBackend`] contract: [`immediate`]
//! mirrors an implicit-state API, [`explicit`] mirrors a root-signature API.
//! [`context::DeviceContext`] selects one at construction time and owns the
//! shared caches.

use log::info;
use sable_core::renderer::traits::backend::{GraphicsBackendKind, PipelineBackend};

pub mod context;
pub mod explicit;
pub mod immediate;

/// Instantiates the backend for `kind`.
pub fn create_backend(kind: GraphicsBackendKind) -> Box<dyn PipelineBackend> {
    info!("Creating {kind:?} graphics backend");
    match kind {
        GraphicsBackendKind::Immediate => Box::new(immediate::ImmediateBackend::new()),
        GraphicsBackendKind::Explicit => Box::new(explicit::ExplicitBackend::new()),
    }
}
