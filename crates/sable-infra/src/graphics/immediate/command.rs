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

//! The implicit-state command list.

use log::trace;
use sable_core::renderer::api::common::Viewport;
use sable_core::renderer::api::invalidation::ResourceSetToken;
use sable_core::renderer::api::pipeline::enums::PrimitiveTopology;
use sable_core::renderer::api::resource_set::{BindingPolicy, ResourceSet};
use sable_core::renderer::api::stats::CommandListStats;
use sable_core::renderer::api::ShaderStages;
use sable_core::renderer::traits::backend::CompiledPso;
use sable_core::renderer::traits::command_list::{
    GraphicsCommandList, IndexStreamBinding, VertexStreamBinding,
};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use super::backend::{ImmediateBindings, ImmediatePso, SlotBinding, StageSlots};

const STAGE_COUNT: usize = ShaderStages::STAGE_COUNT;

fn copy_slot<T: Copy + PartialEq>(
    device: &mut Vec<SlotBinding<T>>,
    source: &[SlotBinding<T>],
    slot: usize,
) {
    let value = source.get(slot).copied().unwrap_or(SlotBinding::Unbound);
    if value == SlotBinding::Unbound {
        return;
    }
    if device.len() <= slot {
        device.resize(slot + 1, SlotBinding::Unbound);
    }
    device[slot] = value;
}

/// Command list for the implicit-state backend.
///
/// Mutating state setters compare against the currently-bound value and
/// skip the device update when nothing changed.
#[derive(Debug, Default)]
pub struct ImmediateCommandList {
    pso: Option<Arc<dyn CompiledPso>>,
    bound_sets: HashMap<u32, (ResourceSetToken, u64)>,
    device_slots: [StageSlots; STAGE_COUNT],
    vertex_streams: Vec<VertexStreamBinding>,
    index_stream: Option<IndexStreamBinding>,
    stencil_ref: Option<u8>,
    viewport: Option<Viewport>,
    inline_constants: HashMap<u32, Vec<u8>>,
    stats: CommandListStats,
    closed: bool,
}

impl ImmediateCommandList {
    /// Creates a list in the initial recording state.
    pub fn new() -> Self {
        Self::default()
    }

    /// The flat binding arrays currently applied for stage `stage`.
    pub fn stage_slots(&self, stage: usize) -> &StageSlots {
        &self.device_slots[stage]
    }

    /// The currently applied stencil reference, if one was set.
    pub fn current_stencil_ref(&self) -> Option<u8> {
        self.stencil_ref
    }

    /// The currently applied viewport, if one was set.
    pub fn current_viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    fn current_pso(&self) -> Option<&ImmediatePso> {
        self.pso
            .as_deref()
            .and_then(|pso| pso.as_any().downcast_ref::<ImmediatePso>())
    }

    fn apply_shader_requested(&mut self, bindings: &ImmediateBindings) {
        // Collect the slot lists first; the PSO borrow cannot live across
        // the device-array mutation.
        let mut per_stage: [(Vec<u32>, Vec<u32>, Vec<u32>); STAGE_COUNT] = Default::default();
        if let Some(pso) = self.current_pso() {
            for stage in 0..STAGE_COUNT {
                per_stage[stage] = (
                    pso.srv_slots(stage).to_vec(),
                    pso.sampler_slots(stage).to_vec(),
                    pso.constant_buffer_slots(stage).to_vec(),
                );
            }
        }
        for stage in 0..STAGE_COUNT {
            let (srvs, samplers, cbs) = &per_stage[stage];
            let source = &bindings.stages[stage];
            let device = &mut self.device_slots[stage];
            for &slot in srvs {
                copy_slot(&mut device.srvs, &source.srvs, slot as usize);
            }
            for &slot in samplers {
                copy_slot(&mut device.samplers, &source.samplers, slot as usize);
            }
            for &slot in cbs {
                copy_slot(&mut device.constant_buffers, &source.constant_buffers, slot as usize);
            }
        }
    }

    fn apply_exhaustive(&mut self, bindings: &ImmediateBindings) {
        for stage in 0..STAGE_COUNT {
            let source = &bindings.stages[stage];
            let device = &mut self.device_slots[stage];
            for slot in 0..source.srvs.len() {
                copy_slot(&mut device.srvs, &source.srvs, slot);
            }
            for slot in 0..source.samplers.len() {
                copy_slot(&mut device.samplers, &source.samplers, slot);
            }
            for slot in 0..source.constant_buffers.len() {
                copy_slot(&mut device.constant_buffers, &source.constant_buffers, slot);
            }
        }
    }

    fn current_topology(&self) -> PrimitiveTopology {
        self.pso
            .as_deref()
            .map(|pso| pso.topology())
            .unwrap_or(PrimitiveTopology::TriangleList)
    }
}

impl GraphicsCommandList for ImmediateCommandList {
    fn reset(&mut self) {
        *self = Self::default();
    }

    fn set_pipeline_state(&mut self, pso: &Arc<dyn CompiledPso>) {
        debug_assert!(!self.closed);
        if let Some(current) = &self.pso {
            if Arc::ptr_eq(current, pso) {
                return;
            }
        }
        self.pso = Some(Arc::clone(pso));
    }

    fn set_resources(&mut self, bind_slot: u32, set: &ResourceSet) {
        debug_assert!(!self.closed);
        let key = (set.token(), set.build_revision());
        if self.bound_sets.get(&bind_slot) == Some(&key) {
            trace!("Resource set {:?} already bound at slot {bind_slot}", key.0);
            return;
        }

        let Some(compiled) = set.compiled() else {
            debug_assert!(false, "resource set bound before it was built");
            return;
        };
        let Some(bindings) = compiled.as_any().downcast_ref::<ImmediateBindings>() else {
            debug_assert!(false, "resource set was built by another backend");
            return;
        };

        let use_exhaustive =
            set.policy() == BindingPolicy::Exhaustive || self.current_pso().is_none();
        if use_exhaustive {
            self.apply_exhaustive(bindings);
        } else {
            self.apply_shader_requested(bindings);
        }
        self.bound_sets.insert(bind_slot, key);
    }

    fn set_vertex_buffers(&mut self, streams: &[VertexStreamBinding]) {
        debug_assert!(!self.closed);
        if self.vertex_streams == streams {
            return;
        }
        self.vertex_streams = streams.to_vec();
    }

    fn set_index_buffer(&mut self, binding: IndexStreamBinding) {
        debug_assert!(!self.closed);
        if self.index_stream == Some(binding) {
            return;
        }
        self.index_stream = Some(binding);
    }

    fn set_stencil_ref(&mut self, stencil_ref: u8) {
        debug_assert!(!self.closed);
        if self.stencil_ref == Some(stencil_ref) {
            return;
        }
        self.stencil_ref = Some(stencil_ref);
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        debug_assert!(!self.closed);
        if self.viewport == Some(viewport) {
            return;
        }
        self.viewport = Some(viewport);
    }

    fn set_inline_constants(&mut self, bind_slot: u32, data: &[u8]) {
        debug_assert!(!self.closed);
        self.inline_constants.insert(bind_slot, data.to_vec());
    }

    fn draw(&mut self, vertex_count: u32, instance_count: u32, _first_vertex: u32) {
        debug_assert!(!self.closed);
        debug_assert!(self.pso.is_some());
        self.stats
            .record_draw(self.current_topology(), vertex_count, instance_count);
    }

    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        _first_index: u32,
        _base_vertex: i32,
    ) {
        debug_assert!(!self.closed);
        debug_assert!(self.index_stream.is_some());
        self.stats
            .record_draw(self.current_topology(), index_count, instance_count);
    }

    fn dispatch(&mut self, _groups_x: u32, _groups_y: u32, _groups_z: u32) {
        debug_assert!(!self.closed);
        self.stats.record_dispatch();
    }

    fn build(&mut self) {
        self.closed = true;
    }

    fn stats(&self) -> CommandListStats {
        self.stats
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
