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

//! The explicit backend's factory surface and compiled artifacts.

use log::debug;
use sable_core::renderer::api::layout::ResourceLayoutDesc;
use sable_core::renderer::api::pipeline::enums::{PrimitiveTopology, TextureFormat};
use sable_core::renderer::api::pso::{GraphicsPsoDescriptor, MAX_RENDER_TARGETS};
use sable_core::renderer::api::render_state::{decode_render_state, DecodedRenderState};
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
use std::sync::Arc;

use super::command::ExplicitCommandList;
use super::descriptors::{DescriptorBlock, DescriptorHeap, ViewDescriptor};
use super::root_signature::RootSignature;

const STAGE_COUNT: usize = ShaderStages::STAGE_COUNT;

/// A compiled resource layout: the root signature.
#[derive(Debug)]
pub struct ExplicitLayout {
    root_signature: Arc<RootSignature>,
}

impl ExplicitLayout {
    /// The compiled root signature.
    pub fn root_signature(&self) -> &Arc<RootSignature> {
        &self.root_signature
    }
}

impl CompiledResourceLayout for ExplicitLayout {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A resource set resolved into a descriptor block.
#[derive(Debug)]
pub struct ExplicitBindings {
    block: DescriptorBlock,
    stages: ShaderStages,
}

impl ExplicitBindings {
    /// The GPU-visible descriptor block, cursor at the block start.
    pub fn block(&self) -> &DescriptorBlock {
        &self.block
    }

    /// The uniform stage visibility of the block.
    pub fn stages(&self) -> ShaderStages {
        self.stages
    }
}

impl CompiledResourceBindings for ExplicitBindings {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A compiled pipeline for the explicit backend: one immutable object
/// embedding every piece of fixed-function state.
#[derive(Debug)]
pub struct ExplicitPso {
    state: DecodedRenderState,
    root_signature: Arc<RootSignature>,
    stage_shaders: [Option<DeviceShaderHandle>; STAGE_COUNT],
    topology: PrimitiveTopology,
    render_target_formats: [Option<TextureFormat>; MAX_RENDER_TARGETS],
    depth_stencil_format: Option<TextureFormat>,
}

impl ExplicitPso {
    /// The decoded fixed-function state baked into the pipeline.
    pub fn state(&self) -> &DecodedRenderState {
        &self.state
    }

    /// The root signature the pipeline binds against.
    pub fn root_signature(&self) -> &Arc<RootSignature> {
        &self.root_signature
    }

    /// The device shader of stage `stage`, if active.
    pub fn stage_shader(&self, stage: usize) -> Option<DeviceShaderHandle> {
        self.stage_shaders[stage]
    }

    /// The bound render-target formats.
    pub fn render_target_formats(&self) -> &[Option<TextureFormat>; MAX_RENDER_TARGETS] {
        &self.render_target_formats
    }

    /// The depth-stencil format, if depth is bound.
    pub fn depth_stencil_format(&self) -> Option<TextureFormat> {
        self.depth_stencil_format
    }
}

impl CompiledPso for ExplicitPso {
    fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The explicit-binding backend, owning the simulated descriptor heap.
#[derive(Debug, Default)]
pub struct ExplicitBackend {
    heap: Arc<DescriptorHeap>,
}

impl ExplicitBackend {
    /// Creates a backend with an empty descriptor heap.
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared descriptor heap.
    pub fn heap(&self) -> &Arc<DescriptorHeap> {
        &self.heap
    }
}

impl PipelineBackend for ExplicitBackend {
    fn kind(&self) -> GraphicsBackendKind {
        GraphicsBackendKind::Explicit
    }

    fn build_resource_set(&self, set: &ResourceSet) -> Box<dyn CompiledResourceBindings> {
        let mut block = self.heap.allocate_block(set.resource_count());

        // Write order matches the root signature's range order: CBVs first,
        // then SRVs over the merged texture+buffer slot space, each in
        // shader-slot order.
        for binding in set.constant_buffers().values() {
            let view = match binding.buffer {
                Some(buffer) => ViewDescriptor::ConstantBufferView(buffer),
                None => ViewDescriptor::Null,
            };
            self.heap.write(&mut block, view);
        }
        let mut srvs: Vec<(u32, ViewDescriptor)> = set
            .textures()
            .iter()
            .map(|(&slot, binding)| {
                let view = match binding.texture {
                    Some(texture) => ViewDescriptor::TextureView(texture, binding.view),
                    None => ViewDescriptor::Null,
                };
                (slot, view)
            })
            .chain(set.buffers().iter().map(|(&slot, binding)| {
                let view = match binding.buffer {
                    Some(buffer) => ViewDescriptor::BufferView(buffer),
                    None => ViewDescriptor::Null,
                };
                (slot, view)
            }))
            .collect();
        srvs.sort_by_key(|(slot, _)| *slot);
        for (_, view) in srvs {
            self.heap.write(&mut block, view);
        }
        block.rewind();

        Box::new(ExplicitBindings {
            block,
            stages: set.shader_stages(),
        })
    }

    fn build_resource_layout(
        &self,
        desc: &ResourceLayoutDesc,
    ) -> Result<Box<dyn CompiledResourceLayout>, LayoutError> {
        let root_signature = RootSignature::compile(desc)?;
        Ok(Box::new(ExplicitLayout {
            root_signature: Arc::new(root_signature),
        }))
    }

    fn compile_pso(
        &self,
        desc: &GraphicsPsoDescriptor,
        shaders: &ShaderInstanceInfo,
        layout: &dyn CompiledResourceLayout,
        reverse_depth: bool,
    ) -> Result<Arc<dyn CompiledPso>, PipelineError> {
        let Some(layout) = layout.as_any().downcast_ref::<ExplicitLayout>() else {
            return Err(PipelineError::CompilationFailed {
                label: None,
                details: "resource layout was built by another backend".to_string(),
            });
        };
        if shaders.stages[0].device_shader.is_none() {
            return Err(PipelineError::CompilationFailed {
                label: None,
                details: "graphics pipeline has no vertex-stage shader".to_string(),
            });
        }

        let mut state = decode_render_state(
            desc.render_state,
            desc.stencil_state,
            u32::from(desc.stencil_read_mask),
            u32::from(desc.stencil_write_mask),
            reverse_depth,
        );
        state.rasterizer.cull_mode = desc.cull_mode;
        state.rasterizer.bias = desc.depth_bias;

        let mut stage_shaders = [None; STAGE_COUNT];
        for (index, stage) in shaders.stages.iter().enumerate() {
            stage_shaders[index] = stage.device_shader;
        }

        debug!(
            "Compiled explicit PSO: shader {:?} technique {} topology {:?}",
            desc.shader, desc.technique, desc.topology
        );

        Ok(Arc::new(ExplicitPso {
            state,
            root_signature: Arc::clone(&layout.root_signature),
            stage_shaders,
            topology: desc.topology,
            render_target_formats: desc.render_target_formats,
            depth_stencil_format: desc.depth_stencil_format,
        }))
    }

    fn create_command_list(&self) -> Box<dyn GraphicsCommandList> {
        Box::new(ExplicitCommandList::new(Arc::clone(&self.heap)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_core::renderer::api::invalidation::{InvalidationRegistry, ResourceSetToken};
    use sable_core::renderer::api::pipeline::enums::CompareFunction;
    use sable_core::renderer::api::resource::{
        BufferId, ResourceLayoutId, ShaderId, TextureId, TextureViewKey,
    };
    use sable_core::renderer::api::resource_set::BindingPolicy;
    use sable_core::renderer::api::RenderState;
    use sable_core::renderer::traits::shader::StageBindings;
    use std::sync::atomic::AtomicUsize;

    fn test_set() -> ResourceSet {
        ResourceSet::new(
            BindingPolicy::ShaderRequested,
            ResourceSetToken(0),
            Arc::new(AtomicUsize::new(0)),
            Arc::new(InvalidationRegistry::new()),
        )
    }

    fn test_shaders() -> ShaderInstanceInfo {
        let mut info = ShaderInstanceInfo::default();
        info.stages[0] = StageBindings {
            device_shader: Some(DeviceShaderHandle(1)),
            ..Default::default()
        };
        info.stages[4] = StageBindings {
            device_shader: Some(DeviceShaderHandle(2)),
            ..Default::default()
        };
        info
    }

    fn test_layout(backend: &ExplicitBackend) -> Box<dyn CompiledResourceLayout> {
        let mut desc = ResourceLayoutDesc::new();
        desc.set_constant_buffer(0, 0, ShaderStages::VERTEX);
        backend.build_resource_layout(&desc).unwrap()
    }

    #[test]
    fn test_descriptor_block_write_order() {
        let backend = ExplicitBackend::new();
        let mut set = test_set();
        set.set_texture(0, Some(TextureId(7)), TextureViewKey::Default, ShaderStages::PIXEL);
        set.set_constant_buffer(1, Some(BufferId(3)), ShaderStages::PIXEL);

        let bindings = backend.build_resource_set(&set);
        let bindings = bindings.as_any().downcast_ref::<ExplicitBindings>().unwrap();
        let start = bindings.block().start();

        assert_eq!(bindings.block().len(), 2);
        assert_eq!(
            backend.heap().descriptor(start),
            ViewDescriptor::ConstantBufferView(BufferId(3))
        );
        assert_eq!(
            backend.heap().descriptor(start + 1),
            ViewDescriptor::TextureView(TextureId(7), TextureViewKey::Default)
        );
    }

    #[test]
    fn test_srv_descriptors_follow_merged_slot_order() {
        let backend = ExplicitBackend::new();
        let mut set = test_set();
        // A raw buffer below a texture in the shared SRV slot space: the
        // heap must hold the slot-0 buffer first, as the signature's first
        // SRV range claims base slot 0.
        set.set_buffer(0, Some(BufferId(3)), ShaderStages::PIXEL);
        set.set_texture(5, Some(TextureId(7)), TextureViewKey::Default, ShaderStages::PIXEL);

        let bindings = backend.build_resource_set(&set);
        let bindings = bindings.as_any().downcast_ref::<ExplicitBindings>().unwrap();
        let start = bindings.block().start();

        assert_eq!(
            backend.heap().descriptor(start),
            ViewDescriptor::BufferView(BufferId(3))
        );
        assert_eq!(
            backend.heap().descriptor(start + 1),
            ViewDescriptor::TextureView(TextureId(7), TextureViewKey::Default)
        );
    }

    #[test]
    fn test_rebuild_allocates_a_fresh_block() {
        let backend = ExplicitBackend::new();
        let mut set = test_set();
        set.set_texture(0, Some(TextureId(1)), TextureViewKey::Default, ShaderStages::PIXEL);

        let first = backend.build_resource_set(&set);
        let second = backend.build_resource_set(&set);
        let first = first.as_any().downcast_ref::<ExplicitBindings>().unwrap();
        let second = second.as_any().downcast_ref::<ExplicitBindings>().unwrap();
        assert_ne!(first.block().start(), second.block().start());
    }

    #[test]
    fn test_reverse_depth_baked_into_pso() {
        let backend = ExplicitBackend::new();
        let layout = test_layout(&backend);
        let mut desc = GraphicsPsoDescriptor::new(ShaderId(1), 0, 0, 0, 0, ResourceLayoutId(0));
        desc.render_state = RenderState(RenderState::DEPTHFUNC_LESS);

        let pso = backend
            .compile_pso(&desc, &test_shaders(), layout.as_ref(), true)
            .unwrap();
        let pso = pso.as_any().downcast_ref::<ExplicitPso>().unwrap();
        assert_eq!(
            pso.state().depth_stencil.depth_compare,
            CompareFunction::Greater
        );
    }

    #[test]
    fn test_foreign_layout_rejected() {
        let backend = ExplicitBackend::new();
        let foreign = crate::graphics::immediate::backend::ImmediateLayout;
        let desc = GraphicsPsoDescriptor::new(ShaderId(1), 0, 0, 0, 0, ResourceLayoutId(0));

        let result = backend.compile_pso(&desc, &test_shaders(), &foreign, false);
        assert!(matches!(
            result,
            Err(PipelineError::CompilationFailed { .. })
        ));
    }
}
