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

//! The contract every graphics backend implements.
//!
//! Two models exist: the immediate backend mirrors an implicit-state API
//! (flat per-stage binding arrays, driver-side state objects), the explicit
//! backend mirrors a root-signature/descriptor-table API. Compiled artifacts
//! are opaque trait objects; each backend downcasts its own artifacts via
//! `as_any`, never another backend's.

use crate::renderer::api::layout::ResourceLayoutDesc;
use crate::renderer::api::pipeline::enums::PrimitiveTopology;
use crate::renderer::api::pso::GraphicsPsoDescriptor;
use crate::renderer::api::resource_set::ResourceSet;
use crate::renderer::error::{LayoutError, PipelineError};
use crate::renderer::traits::command_list::GraphicsCommandList;
use crate::renderer::traits::shader::ShaderInstanceInfo;
use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

/// Which binding model a backend implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphicsBackendKind {
    /// Implicit-state model: per-stage flat binding arrays, redundant-state
    /// filtering in the command list.
    Immediate,
    /// Explicit model: root signatures and descriptor tables.
    Explicit,
}

/// A backend's compiled form of a resource set's bindings.
pub trait CompiledResourceBindings: Send + Sync + Debug {
    /// Downcast access for the owning backend.
    fn as_any(&self) -> &dyn Any;
}

/// A backend's compiled form of a resource layout.
pub trait CompiledResourceLayout: Send + Sync + Debug {
    /// Downcast access for the owning backend.
    fn as_any(&self) -> &dyn Any;
}

/// A compiled pipeline state object.
///
/// Created once by [`PipelineBackend::compile_pso`], cached by the device
/// context, never mutated afterwards.
pub trait CompiledPso: Send + Sync + Debug {
    /// The primitive topology baked into this pipeline.
    fn topology(&self) -> PrimitiveTopology;

    /// Downcast access for the owning backend.
    fn as_any(&self) -> &dyn Any;
}

/// Factory surface implemented by both backends.
pub trait PipelineBackend: Send + Sync + Debug {
    /// The binding model this backend implements.
    fn kind(&self) -> GraphicsBackendKind;

    /// Resolves a resource set's high-level bindings into this backend's
    /// consumable form. Null bindings resolve to placeholder views; this
    /// never fails before draw time.
    fn build_resource_set(&self, set: &ResourceSet) -> Box<dyn CompiledResourceBindings>;

    /// Validates `desc` and compiles it into this backend's layout form.
    ///
    /// The immediate backend only validates; the explicit backend
    /// additionally compiles the root-signature equivalent.
    fn build_resource_layout(
        &self,
        desc: &ResourceLayoutDesc,
    ) -> Result<Box<dyn CompiledResourceLayout>, LayoutError>;

    /// Compiles a pipeline state object from a descriptor, the resolved
    /// shader variant and the built layout.
    fn compile_pso(
        &self,
        desc: &GraphicsPsoDescriptor,
        shaders: &ShaderInstanceInfo,
        layout: &dyn CompiledResourceLayout,
        reverse_depth: bool,
    ) -> Result<Arc<dyn CompiledPso>, PipelineError>;

    /// Creates a fresh command list recording against this backend.
    fn create_command_list(&self) -> Box<dyn GraphicsCommandList>;
}
