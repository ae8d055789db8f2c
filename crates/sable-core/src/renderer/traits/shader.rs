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

//! The seam to the shader system.
//!
//! The shader system (compilation, technique tables, reflection) lives
//! outside this layer. Pipeline construction consumes it through a single
//! call that resolves a shader + technique + permutation flags into
//! per-stage device shaders and reflected binding-slot lists.

use crate::renderer::api::common::ShaderStages;
use crate::renderer::api::resource::ShaderId;
use crate::renderer::error::ShaderError;

/// An opaque handle to a compiled per-stage device shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceShaderHandle(pub u64);

/// Identifies a shader variant: shader, technique and permutation flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderInstanceRequest {
    /// The shader to resolve.
    pub shader: ShaderId,
    /// The technique index within the shader.
    pub technique: usize,
    /// Runtime permutation mask.
    pub runtime_flags: u64,
    /// Material metadata permutation mask.
    pub metadata_flags: u64,
    /// Vertex-modifier metadata permutation mask.
    pub metadata_vertex_flags: u64,
    /// Whether the hull/domain stages may be populated.
    pub allow_tessellation: bool,
}

/// The reflected bindings of one shader stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageBindings {
    /// The compiled device shader for this stage, if the stage is active.
    pub device_shader: Option<DeviceShaderHandle>,
    /// Shader-resource-view slots the stage reads.
    pub srv_slots: Vec<u32>,
    /// Sampler slots the stage reads.
    pub sampler_slots: Vec<u32>,
    /// Constant-buffer slots the stage reads.
    pub constant_buffer_slots: Vec<u32>,
}

/// Per-stage shader handles and reflection data for one resolved variant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderInstanceInfo {
    /// One entry per stage, indexed like [`ShaderStages::stage_indices`].
    pub stages: [StageBindings; ShaderStages::STAGE_COUNT],
}

impl ShaderInstanceInfo {
    /// The union of stages that carry a device shader.
    pub fn active_stages(&self) -> ShaderStages {
        let mut stages = ShaderStages::EMPTY;
        for (index, stage) in self.stages.iter().enumerate() {
            if stage.device_shader.is_some() {
                stages |= ShaderStages::from_bits_truncate(1 << index);
            }
        }
        stages
    }
}

/// Resolves shader variants; implemented by the shader system.
///
/// This is the only external call pipeline construction makes that can
/// fail in normal operation: a variant that is still compiling surfaces as
/// [`ShaderError::VariantUnavailable`] and the pipeline build aborts
/// cleanly.
pub trait ShaderReflection: Send + Sync + std::fmt::Debug {
    /// Resolves `request` into per-stage device shaders and reflection data.
    fn shader_instance_info(
        &self,
        request: &ShaderInstanceRequest,
    ) -> Result<ShaderInstanceInfo, ShaderError>;
}
