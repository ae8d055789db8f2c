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

//! The explicit-binding command list.

use log::trace;
use sable_core::renderer::api::common::Viewport;
use sable_core::renderer::api::invalidation::ResourceSetToken;
use sable_core::renderer::api::pipeline::enums::PrimitiveTopology;
use sable_core::renderer::api::resource_set::ResourceSet;
use sable_core::renderer::api::stats::CommandListStats;
use sable_core::renderer::traits::backend::CompiledPso;
use sable_core::renderer::traits::command_list::{
    GraphicsCommandList, IndexStreamBinding, VertexStreamBinding,
};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use super::backend::{ExplicitBindings, ExplicitPso};
use super::descriptors::DescriptorHeap;
use super::root_signature::RootSignature;

/// Command list for the explicit backend.
///
/// Binding a pipeline also binds its root signature; resource sets attach
/// as descriptor tables at their layout bind slot. The same redundancy
/// filtering contract as the implicit-state list applies.
#[derive(Debug)]
pub struct ExplicitCommandList {
    heap: Arc<DescriptorHeap>,
    pso: Option<Arc<dyn CompiledPso>>,
    root_signature: Option<Arc<RootSignature>>,
    bound_sets: HashMap<u32, (ResourceSetToken, u64)>,
    bound_tables: HashMap<u32, usize>,
    vertex_streams: Vec<VertexStreamBinding>,
    index_stream: Option<IndexStreamBinding>,
    stencil_ref: Option<u8>,
    viewport: Option<Viewport>,
    inline_constants: HashMap<u32, Vec<u8>>,
    stats: CommandListStats,
    closed: bool,
}

impl ExplicitCommandList {
    /// Creates a list recording against `heap`.
    pub fn new(heap: Arc<DescriptorHeap>) -> Self {
        Self {
            heap,
            pso: None,
            root_signature: None,
            bound_sets: HashMap::new(),
            bound_tables: HashMap::new(),
            vertex_streams: Vec::new(),
            index_stream: None,
            stencil_ref: None,
            viewport: None,
            inline_constants: HashMap::new(),
            stats: CommandListStats::default(),
            closed: false,
        }
    }

    /// The currently bound root signature, if a pipeline is bound.
    pub fn current_root_signature(&self) -> Option<&Arc<RootSignature>> {
        self.root_signature.as_ref()
    }

    /// The heap offset of the descriptor table bound at `bind_slot`.
    pub fn bound_table(&self, bind_slot: u32) -> Option<usize> {
        self.bound_tables.get(&bind_slot).copied()
    }

    /// The currently applied stencil reference, if one was set.
    pub fn current_stencil_ref(&self) -> Option<u8> {
        self.stencil_ref
    }

    /// The currently applied viewport, if one was set.
    pub fn current_viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    fn current_topology(&self) -> PrimitiveTopology {
        self.pso
            .as_deref()
            .map(|pso| pso.topology())
            .unwrap_or(PrimitiveTopology::TriangleList)
    }
}

impl GraphicsCommandList for ExplicitCommandList {
    fn reset(&mut self) {
        let heap = Arc::clone(&self.heap);
        *self = Self::new(heap);
    }

    fn set_pipeline_state(&mut self, pso: &Arc<dyn CompiledPso>) {
        debug_assert!(!self.closed);
        if let Some(current) = &self.pso {
            if Arc::ptr_eq(current, pso) {
                return;
            }
        }
        if let Some(explicit) = pso.as_any().downcast_ref::<ExplicitPso>() {
            // A pipeline switch re-binds the root signature; tables bound
            // against the old signature are stale.
            let signature = Arc::clone(explicit.root_signature());
            let changed = self
                .root_signature
                .as_ref()
                .map(|current| !Arc::ptr_eq(current, &signature))
                .unwrap_or(true);
            if changed {
                self.bound_sets.clear();
                self.bound_tables.clear();
            }
            self.root_signature = Some(signature);
        } else {
            debug_assert!(false, "pipeline was compiled by another backend");
        }
        self.pso = Some(Arc::clone(pso));
    }

    fn set_resources(&mut self, bind_slot: u32, set: &ResourceSet) {
        debug_assert!(!self.closed);
        let key = (set.token(), set.build_revision());
        if self.bound_sets.get(&bind_slot) == Some(&key) {
            trace!("Descriptor table for set {:?} already bound at slot {bind_slot}", key.0);
            return;
        }

        let Some(compiled) = set.compiled() else {
            debug_assert!(false, "resource set bound before it was built");
            return;
        };
        let Some(bindings) = compiled.as_any().downcast_ref::<ExplicitBindings>() else {
            debug_assert!(false, "resource set was built by another backend");
            return;
        };

        self.bound_tables.insert(bind_slot, bindings.block().start());
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
