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

//! End-to-end tests driving the full pipeline path through the device
//! context: resource sets, layouts, pipelines and command lists on both
//! backends.

use sable_core::renderer::api::layout::ResourceLayoutDesc;
use sable_core::renderer::api::pso::GraphicsPsoDescriptor;
use sable_core::renderer::api::resource::{
    BufferId, ResourceLayoutId, SamplerStateDesc, ShaderId, TextureId, TextureSemantic,
    TextureViewKey,
};
use sable_core::renderer::api::resource_set::BindingPolicy;
use sable_core::renderer::api::{RenderState, ShaderStages};
use sable_core::renderer::error::{LayoutError, ShaderError};
use sable_core::renderer::traits::backend::GraphicsBackendKind;
use sable_core::renderer::traits::command_list::push_inline_constants;
use sable_core::renderer::traits::material::{DefaultResources, MaterialResources};
use sable_core::renderer::traits::shader::{
    DeviceShaderHandle, ShaderInstanceInfo, ShaderInstanceRequest, ShaderReflection, StageBindings,
};
use sable_infra::DeviceContext;
use std::sync::Arc;

const BOTH_BACKENDS: [GraphicsBackendKind; 2] =
    [GraphicsBackendKind::Immediate, GraphicsBackendKind::Explicit];

/// Reflection stub: every shader resolves to a vertex+pixel variant whose
/// pixel stage reads SRV slots 0-2, sampler 0 and constant buffers 0 and 3.
#[derive(Debug)]
struct StubReflection;

impl ShaderReflection for StubReflection {
    fn shader_instance_info(
        &self,
        request: &ShaderInstanceRequest,
    ) -> Result<ShaderInstanceInfo, ShaderError> {
        let mut info = ShaderInstanceInfo::default();
        info.stages[0] = StageBindings {
            device_shader: Some(DeviceShaderHandle(request.shader.0 as u64)),
            constant_buffer_slots: vec![0],
            ..Default::default()
        };
        info.stages[4] = StageBindings {
            device_shader: Some(DeviceShaderHandle(request.shader.0 as u64 + 1000)),
            srv_slots: vec![0, 1, 2],
            sampler_slots: vec![0],
            constant_buffer_slots: vec![0, 3],
        };
        Ok(info)
    }
}

struct StubMaterial {
    diffuse: TextureId,
}

impl MaterialResources for StubMaterial {
    fn texture(&self, semantic: TextureSemantic) -> Option<TextureId> {
        (semantic == TextureSemantic::Diffuse).then_some(self.diffuse)
    }

    fn constant_buffer(&self) -> BufferId {
        BufferId(77)
    }
}

struct StubDefaults;

impl DefaultResources for StubDefaults {
    fn default_texture(&self, semantic: TextureSemantic) -> TextureId {
        TextureId(1000 + semantic.shader_slot() as usize)
    }
}

fn make_context(kind: GraphicsBackendKind) -> DeviceContext {
    let _ = env_logger::builder().is_test(true).try_init();
    DeviceContext::new(kind, Arc::new(StubReflection))
}

fn make_layout(context: &DeviceContext) -> ResourceLayoutId {
    let mut set = context.create_resource_set(BindingPolicy::ShaderRequested);
    set.set_texture(
        0,
        Some(TextureId(1)),
        TextureViewKey::Default,
        ShaderStages::PIXEL,
    );
    set.set_sampler(
        0,
        sable_core::renderer::api::SamplerId(1),
        SamplerStateDesc::default(),
        ShaderStages::PIXEL,
    );

    let mut desc = ResourceLayoutDesc::new();
    desc.set_resource_set(0, &set);
    desc.set_constant_buffer(1, 0, ShaderStages::VERTEX);
    context.create_resource_layout(&desc).unwrap()
}

#[test]
fn test_resource_set_lifecycle_end_to_end() {
    for kind in BOTH_BACKENDS {
        let context = make_context(kind);
        let mut set = context.create_resource_set(BindingPolicy::ShaderRequested);

        set.set_texture(
            0,
            Some(TextureId(10)),
            TextureViewKey::Default,
            ShaderStages::PIXEL,
        );
        set.set_constant_buffer(
            1,
            Some(BufferId(20)),
            ShaderStages::VERTEX | ShaderStages::PIXEL,
        );

        assert_eq!(
            set.shader_stages(),
            ShaderStages::VERTEX | ShaderStages::PIXEL
        );
        assert!(set.is_dirty());

        context.build_resource_set(&mut set);
        assert!(!set.is_dirty());

        set.set_texture(
            0,
            Some(TextureId(11)),
            TextureViewKey::Default,
            ShaderStages::PIXEL,
        );
        assert!(set.is_dirty());
    }
}

#[test]
fn test_pso_cache_shares_instances_across_equal_descriptors() {
    for kind in BOTH_BACKENDS {
        let context = make_context(kind);
        let layout = make_layout(&context);

        let mut desc = GraphicsPsoDescriptor::new(ShaderId(4), 0, 0x8, 0, 0, layout);
        desc.render_state = RenderState(RenderState::DEPTHWRITE);
        let rebuilt = desc.clone();

        let a = context.create_graphics_pso(&desc).unwrap();
        let b = context.create_graphics_pso(&rebuilt).unwrap();
        assert!(Arc::ptr_eq(&a, &b), "cache miss on {kind:?}");

        // A differing descriptor compiles separately.
        let mut other = desc.clone();
        other.render_state = RenderState(0);
        let c = context.create_graphics_pso(&other).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(context.pso_cache_len(), 2);
    }
}

#[test]
fn test_layout_validation_surfaces_through_context() {
    for kind in BOTH_BACKENDS {
        let context = make_context(kind);

        let mut gapped = ResourceLayoutDesc::new();
        gapped.set_constant_buffer(0, 0, ShaderStages::VERTEX);
        gapped.set_constant_buffer(1, 1, ShaderStages::VERTEX);
        gapped.set_constant_buffer(3, 2, ShaderStages::VERTEX);
        assert_eq!(
            context.create_resource_layout(&gapped),
            Err(LayoutError::SlotGap { missing_slot: 2 })
        );

        let mut contiguous = ResourceLayoutDesc::new();
        contiguous.set_constant_buffer(0, 0, ShaderStages::VERTEX);
        contiguous.set_constant_buffer(1, 1, ShaderStages::VERTEX);
        contiguous.set_constant_buffer(2, 2, ShaderStages::VERTEX);
        assert!(context.create_resource_layout(&contiguous).is_ok());
    }
}

#[test]
fn test_material_fill_binds_every_semantic() {
    let context = make_context(GraphicsBackendKind::Immediate);
    let mut set = context.create_resource_set(BindingPolicy::ShaderRequested);

    let material = StubMaterial {
        diffuse: TextureId(42),
    };
    set.fill(&material, &StubDefaults, ShaderStages::PIXEL);

    assert_eq!(set.textures().len(), TextureSemantic::ALL.len());
    let diffuse = set.textures()[&TextureSemantic::Diffuse.shader_slot()];
    assert_eq!(diffuse.texture, Some(TextureId(42)));

    // Semantics the material leaves empty fall back to engine defaults.
    let normals = set.textures()[&TextureSemantic::Normals.shader_slot()];
    assert_eq!(
        normals.texture,
        Some(TextureId(1000 + TextureSemantic::Normals.shader_slot() as usize))
    );
}

#[test]
fn test_draw_records_primitives_through_pooled_lists() {
    for kind in BOTH_BACKENDS {
        let context = make_context(kind);
        let layout = make_layout(&context);
        let desc = GraphicsPsoDescriptor::new(ShaderId(2), 0, 0, 0, 0, layout);
        let pso = context.create_graphics_pso(&desc).unwrap();

        let mut set = context.create_resource_set(BindingPolicy::ShaderRequested);
        set.set_texture(
            0,
            Some(TextureId(5)),
            TextureViewKey::Default,
            ShaderStages::PIXEL,
        );
        context.build_resource_set(&mut set);

        let mut lists = context.acquire_graphics_command_lists(1);
        {
            let list = &mut lists[0];
            list.set_pipeline_state(&pso);
            list.set_resources(0, &set);
            push_inline_constants(&mut **list, 1, &[0.0f32, 1.0, 0.0, 1.0]);
            list.draw(300, 1, 0);
            list.build();
            assert_eq!(list.stats().draw_calls, 1);
            assert_eq!(list.stats().primitives, 100);
        }
        context.forfeit_graphics_command_lists(lists).unwrap();
        assert_eq!(context.graphics_submission_count(), 1);
    }
}

#[test]
fn test_texture_invalidation_re_dirties_dependent_sets() {
    for kind in BOTH_BACKENDS {
        let context = make_context(kind);
        let mut dependent = context.create_resource_set(BindingPolicy::ShaderRequested);
        let mut bystander = context.create_resource_set(BindingPolicy::ShaderRequested);

        dependent.set_texture(
            0,
            Some(TextureId(7)),
            TextureViewKey::Default,
            ShaderStages::PIXEL,
        );
        bystander.set_texture(
            0,
            Some(TextureId(8)),
            TextureViewKey::Default,
            ShaderStages::PIXEL,
        );
        context.build_resource_set(&mut dependent);
        context.build_resource_set(&mut bystander);

        assert_eq!(context.invalidate_texture(TextureId(7)), 1);
        assert!(dependent.is_dirty());
        assert!(!bystander.is_dirty());
    }
}

#[test]
fn test_reverse_depth_affects_only_new_pipelines() {
    let context = make_context(GraphicsBackendKind::Immediate);
    let layout = make_layout(&context);

    let mut desc = GraphicsPsoDescriptor::new(ShaderId(3), 0, 0, 0, 0, layout);
    desc.render_state = RenderState(RenderState::DEPTHFUNC_LESS);
    let conventional = context.create_graphics_pso(&desc).unwrap();

    context.set_reverse_depth(true);
    context.invalidate_pso_cache();
    let reversed = context.create_graphics_pso(&desc).unwrap();
    assert!(!Arc::ptr_eq(&conventional, &reversed));
}
