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

//! The architectural seams of the binding layer.
//!
//! - [`PipelineBackend`]: the contract both binding-model backends implement.
//! - [`GraphicsCommandList`]: the stateful recording surface.
//! - [`ShaderReflection`]: the external shader-system collaborator.
//! - [`MaterialResources`] / [`DefaultResources`]: the material collaborators.

pub mod backend;
pub mod command_list;
pub mod material;
pub mod shader;

pub use self::backend::{
    CompiledPso, CompiledResourceBindings, CompiledResourceLayout, GraphicsBackendKind,
    PipelineBackend,
};
pub use self::command_list::{
    push_inline_constants, GraphicsCommandList, IndexStreamBinding, VertexStreamBinding,
};
pub use self::material::{DefaultResources, MaterialResources};
pub use self::shader::{
    DeviceShaderHandle, ShaderInstanceInfo, ShaderInstanceRequest, ShaderReflection, StageBindings,
};
