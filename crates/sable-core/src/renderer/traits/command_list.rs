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

//! The command-list recording surface.

use crate::renderer::api::common::Viewport;
use crate::renderer::api::pipeline::enums::IndexFormat;
use crate::renderer::api::resource::BufferId;
use crate::renderer::api::resource_set::ResourceSet;
use crate::renderer::api::stats::CommandListStats;
use crate::renderer::traits::backend::CompiledPso;
use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

/// One bound vertex stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexStreamBinding {
    /// The input slot the stream feeds.
    pub slot: u32,
    /// The buffer providing the stream.
    pub buffer: BufferId,
    /// Byte distance between consecutive vertices.
    pub stride: u32,
    /// Byte offset of the first vertex.
    pub offset: u64,
}

/// The bound index stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStreamBinding {
    /// The buffer providing the indices.
    pub buffer: BufferId,
    /// The index element format.
    pub format: IndexFormat,
    /// Byte offset of the first index.
    pub offset: u64,
}

/// A stateful recording surface for draw and dispatch work.
///
/// Every state setter filters redundant updates: setting a value equal to
/// the currently-bound one is a no-op. This is load-bearing, not an
/// optimization; some backends reject or misbehave on re-binding identical
/// state mid-pass.
///
/// The command list performs no validation of bound state. Drawing with a
/// missing or mismatched pipeline is a precondition violation whose effect
/// is an incorrect draw, matching thin-driver semantics; the only checked
/// surface in this layer is resource-layout validation.
pub trait GraphicsCommandList: Debug + Send {
    /// Returns the list to its initial state and clears its counters.
    fn reset(&mut self);

    /// Binds a compiled pipeline. No-op if `pso` is already bound.
    fn set_pipeline_state(&mut self, pso: &Arc<dyn CompiledPso>);

    /// Binds a resource set at a layout bind slot. No-op if the same build
    /// of the same set is already bound there.
    fn set_resources(&mut self, bind_slot: u32, set: &ResourceSet);

    /// Binds vertex streams. No-op if the same streams are already bound.
    fn set_vertex_buffers(&mut self, streams: &[VertexStreamBinding]);

    /// Binds the index stream. No-op if it is already bound.
    fn set_index_buffer(&mut self, binding: IndexStreamBinding);

    /// Sets the stencil reference value. No-op if unchanged.
    fn set_stencil_ref(&mut self, stencil_ref: u8);

    /// Sets the viewport. No-op if unchanged. Callers working in a
    /// reverse-depth view pass an already-converted viewport.
    fn set_viewport(&mut self, viewport: Viewport);

    /// Pushes inline constants for a layout bind slot.
    fn set_inline_constants(&mut self, bind_slot: u32, data: &[u8]);

    /// Records a non-indexed draw.
    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32);

    /// Records an indexed draw.
    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        base_vertex: i32,
    );

    /// Records a compute dispatch.
    fn dispatch(&mut self, groups_x: u32, groups_y: u32, groups_z: u32);

    /// Finalizes recording. The list must not record further work until
    /// [`GraphicsCommandList::reset`].
    fn build(&mut self);

    /// The profiling counters recorded so far.
    fn stats(&self) -> CommandListStats;

    /// Downcast access for backend-specific inspection.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Pushes a plain-old-data value as inline constants.
///
/// Convenience over [`GraphicsCommandList::set_inline_constants`] for typed
/// per-draw data such as transform or instance indices.
pub fn push_inline_constants<T: bytemuck::Pod>(
    list: &mut dyn GraphicsCommandList,
    bind_slot: u32,
    value: &T,
) {
    list.set_inline_constants(bind_slot, bytemuck::bytes_of(value));
}
