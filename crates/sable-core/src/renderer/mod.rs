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

//! The backend-agnostic contracts of the pipeline-state and resource-binding
//! layer.
//!
//! This module is the "common language" both binding-model backends speak. It
//! carries the data model (packed state words, resource sets, layouts, the
//! PSO descriptor) and the abstract `traits` the `sable-infra` crate
//! implements. The 'what' lives here; the 'how' lives in the backends.

pub mod api;
pub mod error;
pub mod traits;

// Re-export the most important traits and types for easier use.
pub use self::api::*;
pub use self::error::{LayoutError, PipelineError, RenderError, ResourceError, ShaderError};
pub use self::traits::{
    CompiledPso, CompiledResourceBindings, CompiledResourceLayout, GraphicsBackendKind,
    GraphicsCommandList, PipelineBackend, ShaderReflection,
};
