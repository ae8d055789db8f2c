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

//! The implicit-state backend's factory surface and compiled artifacts.

use log::debug;
use sable_core::renderer::api::layout::ResourceLayoutDesc;
use sable_core::renderer::api::pipeline::enums::PrimitiveTopology;
use sable_core::renderer::api::pipeline::state::{
    BlendStateDescriptor, DepthStencilStateDescriptor, RasterizerStateDescriptor,
};
use sable_core::renderer::api::pso::GraphicsPsoDescriptor;
use sable_core::renderer::api::render_state::decode_render_state;
use sable_core::renderer::api::resource::{BufferId, SamplerId, TextureId, TextureViewKey};
use sable_core::renderer::api::resource_set::ResourceSet;
use sable_core::renderer::api::ShaderStages;
use sable_core::renderer::error::{LayoutError, PipelineError};
use sable_core::renderer::traits::backend::{
    CompiledPso, CompiledResourceBindings, CompiledResourceLayout, GraphicsBackendKind,
    PipelineBackend,
};
use sable_core::renderer::traits::command_list::GraphicsCommandList;
use sable_core::renderer::traits::shader::{DeviceShaderHandle, ShaderInstanceInfo};
use std::any::Any;
use std::sync::{Arc, Mutex};

use super::command::ImmediateCommandList;

const STAGE_COUNT: usize = ShaderStages::STAGE_COUNT;

/// The state of one binding slot in a flat per-stage array.
///
/// `Unbound` (the array default) is distinct from `Null`: a set that
/// explicitly binds a null resource clears the device slot, a slot the set
/// never touched is left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotBinding<T> {
    /// The set says nothing about this slot.
    #[default]
    Unbound,
    /// The set explicitly binds nothing here.
    Null,
    /// A live binding.
    Bound(T),
}

/// What a shader-resource-view slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SrvBinding {
    /// A texture view.
    Texture(TextureId, TextureViewKey),
    /// A raw buffer view.
    Buffer(BufferId),
}

/// The flat binding arrays of one shader stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageSlots {
    /// Shader-resource-view slots (textures and raw buffers).
    pub srvs: Vec<SlotBinding<SrvBinding>>,
    /// Sampler slots.
    pub samplers: Vec<SlotBinding<SamplerId>>,
    /// Constant-buffer slots.
    pub constant_buffers: Vec<SlotBinding<BufferId>>,
}

fn set_slot<T: Copy>(slots: &mut Vec<SlotBinding<T>>, slot: u32, value: SlotBinding<T>) {
    let index = slot as usize;
    if slots.len() <= index {
        slots.resize(index + 1, SlotBinding::Unbound);
    }
    slots[index] = value;
}

/// A resource set resolved into per-stage flat arrays.
#[derive(Debug, Default)]
pub struct ImmediateBindings {
    /// One array set per stage, indexed like `ShaderStages::stage_indices`.
    pub stages: [StageSlots; STAGE_COUNT],
}

impl ImmediateBindings {
    fn from_set(set: &ResourceSet) -> Self {
        let mut bindings = Self::default();

        for (&slot, binding) in set.textures() {
            let value = match binding.texture {
                Some(texture) => SlotBinding::Bound(SrvBinding::Texture(texture, binding.view)),
                None => SlotBinding::Null,
            };
            for stage in binding.stages.stage_indices() {
                set_slot(&mut bindings.stages[stage].srvs, slot, value);
            }
        }
        for (&slot, binding) in set.buffers() {
            let value = match binding.buffer {
                Some(buffer) => SlotBinding::Bound(SrvBinding::Buffer(buffer)),
                None => SlotBinding::Null,
            };
            for stage in binding.stages.stage_indices() {
                set_slot(&mut bindings.stages[stage].srvs, slot, value);
            }
        }
        for (&slot, binding) in set.samplers() {
            for stage in binding.stages.stage_indices() {
                set_slot(
                    &mut bindings.stages[stage].samplers,
                    slot,
                    SlotBinding::Bound(binding.sampler),
                );
            }
        }
        for (&slot, binding) in set.constant_buffers() {
            let value = match binding.buffer {
                Some(buffer) => SlotBinding::Bound(buffer),
                None => SlotBinding::Null,
            };
            for stage in binding.stages.stage_indices() {
                set_slot(&mut bindings.stages[stage].constant_buffers, slot, value);
            }
        }

        bindings
    }
}

impl CompiledResourceBindings for ImmediateBindings {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A validated layout. The implicit-state model has no root signature, so
/// the compiled form carries nothing beyond the validation result.
#[derive(Debug)]
pub struct ImmediateLayout;

impl CompiledResourceLayout for ImmediateLayout {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A compiled pipeline for the implicit-state backend.
///
/// Holds the deduplicated fixed-function state blocks, the per-stage device
/// shaders, and the shader-requested binding-slot lists the command list's
/// default binding policy walks.
#[derive(Debug)]
pub struct ImmediatePso {
    blend: Arc<BlendStateDescriptor>,
    depth_stencil: Arc<DepthStencilStateDescriptor>,
    rasterizer: Arc<RasterizerStateDescriptor>,
    stage_shaders: [Option<DeviceShaderHandle>; STAGE_COUNT],
    srv_slots: [Vec<u32>; STAGE_COUNT],
    sampler_slots: [Vec<u32>; STAGE_COUNT],
    constant_buffer_slots: [Vec<u32>; STAGE_COUNT],
    topology: PrimitiveTopology,
}

impl ImmediatePso {
    /// The deduplicated blend state block.
    pub fn blend(&self) -> &BlendStateDescriptor {
        &self.blend
    }

    /// The deduplicated depth-stencil state block.
    pub fn depth_stencil(&self) -> &DepthStencilStateDescriptor {
        &self.depth_stencil
    }

    /// The deduplicated rasterizer state block.
    pub fn rasterizer(&self) -> &RasterizerStateDescriptor {
        &self.rasterizer
    }

    /// The device shader of stage `stage`, if active.
    pub fn stage_shader(&self, stage: usize) -> Option<DeviceShaderHandle> {
        self.stage_shaders[stage]
    }

    pub(crate) fn srv_slots(&self, stage: usize) -> &[u32] {
        &self.srv_slots[stage]
    }

    pub(crate) fn sampler_slots(&self, stage: usize) -> &[u32] {
        &self.sampler_slots[stage]
    }

    pub(crate) fn constant_buffer_slots(&self, stage: usize) -> &[u32] {
        &self.constant_buffer_slots[stage]
    }
}

impl CompiledPso for ImmediatePso {
    fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The implicit-state backend.
///
/// Identical decoded state blocks are shared between pipelines through
/// small per-category caches, mirroring how the underlying API deduplicates
/// driver state objects.
#[derive(Debug, Default)]
pub struct ImmediateBackend {
    blend_cache: Mutex<Vec<Arc<BlendStateDescriptor>>>,
    depth_stencil_cache: Mutex<Vec<Arc<DepthStencilStateDescriptor>>>,
    rasterizer_cache: Mutex<Vec<Arc<RasterizerStateDescriptor>>>,
}

fn dedup_state<T: Clone + PartialEq>(cache: &Mutex<Vec<Arc<T>>>, state: &T) -> Arc<T> {
    let mut cache = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(existing) = cache.iter().find(|entry| entry.as_ref() == state) {
        return Arc::clone(existing);
    }
    let entry = Arc::new(state.clone());
    cache.push(Arc::clone(&entry));
    entry
}

impl ImmediateBackend {
    /// Creates a backend with empty state caches.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of distinct state blocks currently cached, per category
    /// (blend, depth-stencil, rasterizer).
    pub fn state_cache_sizes(&self) -> (usize, usize, usize) {
        let blend = self
            .blend_cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len();
        let depth = self
            .depth_stencil_cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len();
        let raster = self
            .rasterizer_cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len();
        (blend, depth, raster)
    }
}

impl PipelineBackend for ImmediateBackend {
    fn kind(&self) -> GraphicsBackendKind {
        GraphicsBackendKind::Immediate
    }

    fn build_resource_set(&self, set: &ResourceSet) -> Box<dyn CompiledResourceBindings> {
        Box::new(ImmediateBindings::from_set(set))
    }

    fn build_resource_layout(
        &self,
        desc: &ResourceLayoutDesc,
    ) -> Result<Box<dyn CompiledResourceLayout>, LayoutError> {
        desc.validate()?;
        Ok(Box::new(ImmediateLayout))
    }

    fn compile_pso(
        &self,
        desc: &GraphicsPsoDescriptor,
        shaders: &ShaderInstanceInfo,
        _layout: &dyn CompiledResourceLayout,
        reverse_depth: bool,
    ) -> Result<Arc<dyn CompiledPso>, PipelineError> {
        if shaders.stages[0].device_shader.is_none() {
            return Err(PipelineError::CompilationFailed {
                label: None,
                details: "graphics pipeline has no vertex-stage shader".to_string(),
            });
        }

        let mut decoded = decode_render_state(
            desc.render_state,
            desc.stencil_state,
            u32::from(desc.stencil_read_mask),
            u32::from(desc.stencil_write_mask),
            reverse_depth,
        );
        decoded.rasterizer.cull_mode = desc.cull_mode;
        decoded.rasterizer.bias = desc.depth_bias;

        let mut stage_shaders = [None; STAGE_COUNT];
        let mut srv_slots: [Vec<u32>; STAGE_COUNT] = Default::default();
        let mut sampler_slots: [Vec<u32>; STAGE_COUNT] = Default::default();
        let mut constant_buffer_slots: [Vec<u32>; STAGE_COUNT] = Default::default();
        for (index, stage) in shaders.stages.iter().enumerate() {
            stage_shaders[index] = stage.device_shader;
            if stage.device_shader.is_some() {
                srv_slots[index] = stage.srv_slots.clone();
                sampler_slots[index] = stage.sampler_slots.clone();
                constant_buffer_slots[index] = stage.constant_buffer_slots.clone();
            }
        }

        debug!(
            "Compiled immediate PSO: shader {:?} technique {} topology {:?}",
            desc.shader, desc.technique, desc.topology
        );

        Ok(Arc::new(ImmediatePso {
            blend: dedup_state(&self.blend_cache, &decoded.blend),
            depth_stencil: dedup_state(&self.depth_stencil_cache, &decoded.depth_stencil),
            rasterizer: dedup_state(&self.rasterizer_cache, &decoded.rasterizer),
            stage_shaders,
            srv_slots,
            sampler_slots,
            constant_buffer_slots,
            topology: desc.topology,
        }))
    }

    fn create_command_list(&self) -> Box<dyn GraphicsCommandList> {
        Box::new(ImmediateCommandList::new())
    }
}
