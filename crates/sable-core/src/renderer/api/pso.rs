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

//! The pipeline-state descriptor: the PSO cache's key.
//!
//! The descriptor captures everything a backend pipeline compile depends on,
//! by value, so two field-wise-equal descriptors hash equal and hit the same
//! cache entry. The stencil reference value is deliberately absent; it is
//! dynamic command-list state.

use super::pipeline::enums::{CullMode, PrimitiveTopology, TextureFormat};
use super::pipeline::state::DepthBiasState;
use super::render_state::{RenderState, StencilState};
use super::resource::{ResourceLayoutId, ShaderId};
use crate::sable_bitflags;

/// The maximum number of simultaneously bound render targets.
pub const MAX_RENDER_TARGETS: usize = 8;

/// An opaque identifier of a vertex input format, owned by the geometry
/// system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VertexFormatId(pub u32);

sable_bitflags! {
    /// Which vertex streams feed input-layout generation.
    pub struct VertexStreamMasks: u32 {
        /// Positions.
        const POSITION = 1 << 0;
        /// Per-vertex normals.
        const NORMALS = 1 << 1;
        /// Full-precision tangent frames.
        const TANGENTS = 1 << 2;
        /// Quantized tangent frames. Mutually exclusive with
        /// [`VertexStreamMasks::TANGENTS`].
        const QUANTIZED_TANGENTS = 1 << 3;
        /// Vertex colors.
        const COLORS = 1 << 4;
        /// Texture coordinates.
        const TEXCOORDS = 1 << 5;
        /// Per-instance data stream.
        const INSTANCED = 1 << 6;
    }
}

/// Combines the shader-declared stream mask with what the object's geometry
/// actually provides.
///
/// Object data takes precedence for three attributes only: normals and
/// instancing are OR'd in, and quantized tangents both set their own bit and
/// clear the full-precision tangents bit. Everything else follows the shader.
pub fn combine_vertex_stream_masks(
    shader: VertexStreamMasks,
    object: VertexStreamMasks,
) -> VertexStreamMasks {
    let mut combined = shader;
    if object.contains(VertexStreamMasks::NORMALS) {
        combined.insert(VertexStreamMasks::NORMALS);
    }
    if object.contains(VertexStreamMasks::QUANTIZED_TANGENTS) {
        combined.remove(VertexStreamMasks::TANGENTS);
        combined.insert(VertexStreamMasks::QUANTIZED_TANGENTS);
    }
    if object.contains(VertexStreamMasks::INSTANCED) {
        combined.insert(VertexStreamMasks::INSTANCED);
    }
    combined
}

/// The object-side half of a draw: what the main render pipeline knows about
/// a renderable when it requests a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawDescription {
    /// The shader to draw with.
    pub shader: ShaderId,
    /// The technique index within the shader.
    pub technique: u32,
    /// The object's runtime permutation mask.
    pub runtime_flags: u64,
    /// The stream mask the shader declares.
    pub shader_stream_mask: VertexStreamMasks,
    /// The streams the object's geometry provides.
    pub object_stream_mask: VertexStreamMasks,
    /// The object's vertex input format.
    pub vertex_format: VertexFormatId,
    /// The primitive topology to assemble.
    pub topology: PrimitiveTopology,
}

/// The complete, hashable description of a graphics pipeline.
///
/// Construct via [`GraphicsPsoDescriptor::new`] for utility passes or
/// [`GraphicsPsoDescriptor::from_draw_description`] for the main pipeline,
/// then adjust the public state fields before handing it to the device
/// context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphicsPsoDescriptor {
    /// The shader to compile against.
    pub shader: ShaderId,
    /// The technique index within the shader.
    pub technique: u32,
    /// Runtime permutation mask.
    pub runtime_flags: u64,
    /// Static metadata permutation mask.
    pub metadata_flags: u64,
    /// Vertex-declaration metadata permutation mask.
    pub metadata_vertex_flags: u64,
    /// The packed fixed-function render state.
    pub render_state: RenderState,
    /// The packed stencil functions and operations.
    pub stencil_state: StencilState,
    /// Stencil read mask.
    pub stencil_read_mask: u8,
    /// Stencil write mask.
    pub stencil_write_mask: u8,
    /// The vertex input format.
    pub vertex_format: VertexFormatId,
    /// The combined vertex stream mask.
    pub vertex_streams: VertexStreamMasks,
    /// The primitive topology.
    pub topology: PrimitiveTopology,
    /// Bound render-target formats, `None` for unbound slots.
    pub render_target_formats: [Option<TextureFormat>; MAX_RENDER_TARGETS],
    /// The depth-stencil target format, if depth is bound.
    pub depth_stencil_format: Option<TextureFormat>,
    /// Rasterizer depth bias.
    pub depth_bias: DepthBiasState,
    /// Face culling, `None` to rasterize both faces. Not part of the packed
    /// render state; patched into the decoded rasterizer block.
    pub cull_mode: Option<CullMode>,
    /// The resource layout the pipeline binds against, by identity.
    pub resource_layout: ResourceLayoutId,
    /// Whether hull/domain stages may be activated.
    pub allow_tessellation: bool,
}

impl GraphicsPsoDescriptor {
    /// Creates a descriptor from explicit shader/technique/permutation
    /// parameters, the path utility and post-process passes take.
    pub fn new(
        shader: ShaderId,
        technique: u32,
        runtime_flags: u64,
        metadata_flags: u64,
        metadata_vertex_flags: u64,
        resource_layout: ResourceLayoutId,
    ) -> Self {
        Self {
            shader,
            technique,
            runtime_flags,
            metadata_flags,
            metadata_vertex_flags,
            render_state: RenderState::default(),
            stencil_state: StencilState::default(),
            stencil_read_mask: 0xFF,
            stencil_write_mask: 0xFF,
            vertex_format: VertexFormatId::default(),
            vertex_streams: VertexStreamMasks::EMPTY,
            topology: PrimitiveTopology::TriangleList,
            render_target_formats: [None; MAX_RENDER_TARGETS],
            depth_stencil_format: None,
            depth_bias: DepthBiasState::default(),
            cull_mode: Some(CullMode::Back),
            resource_layout,
            allow_tessellation: false,
        }
    }

    /// Creates a descriptor from a high-level draw description, combining
    /// the shader's and the object's vertex stream masks.
    pub fn from_draw_description(desc: &DrawDescription, resource_layout: ResourceLayoutId) -> Self {
        let mut pso = Self::new(
            desc.shader,
            desc.technique,
            desc.runtime_flags,
            0,
            0,
            resource_layout,
        );
        pso.vertex_format = desc.vertex_format;
        pso.vertex_streams =
            combine_vertex_stream_masks(desc.shader_stream_mask, desc.object_stream_mask);
        pso.topology = desc.topology;
        pso
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(desc: &GraphicsPsoDescriptor) -> u64 {
        let mut hasher = DefaultHasher::new();
        desc.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_equal_descriptors_hash_equal() {
        let a = GraphicsPsoDescriptor::new(ShaderId(1), 0, 0x10, 0, 0, ResourceLayoutId(2));
        let b = GraphicsPsoDescriptor::new(ShaderId(1), 0, 0x10, 0, 0, ResourceLayoutId(2));
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_render_state_distinguishes_descriptors() {
        let a = GraphicsPsoDescriptor::new(ShaderId(1), 0, 0, 0, 0, ResourceLayoutId(0));
        let mut b = a.clone();
        b.render_state = RenderState(RenderState::DEPTHWRITE);
        assert_ne!(a, b);
    }

    #[test]
    fn test_combine_masks_ors_normals() {
        let combined = combine_vertex_stream_masks(
            VertexStreamMasks::POSITION,
            VertexStreamMasks::NORMALS,
        );
        assert_eq!(
            combined,
            VertexStreamMasks::POSITION | VertexStreamMasks::NORMALS
        );
    }

    #[test]
    fn test_quantized_tangents_clear_plain_tangents() {
        let combined = combine_vertex_stream_masks(
            VertexStreamMasks::POSITION | VertexStreamMasks::TANGENTS,
            VertexStreamMasks::QUANTIZED_TANGENTS,
        );
        assert!(!combined.contains(VertexStreamMasks::TANGENTS));
        assert!(combined.contains(VertexStreamMasks::QUANTIZED_TANGENTS));
    }

    #[test]
    fn test_instancing_carried_from_object() {
        let combined = combine_vertex_stream_masks(
            VertexStreamMasks::POSITION,
            VertexStreamMasks::INSTANCED,
        );
        assert!(combined.contains(VertexStreamMasks::INSTANCED));
    }

    #[test]
    fn test_shader_only_streams_survive() {
        let combined = combine_vertex_stream_masks(
            VertexStreamMasks::POSITION | VertexStreamMasks::TEXCOORDS,
            VertexStreamMasks::EMPTY,
        );
        assert_eq!(
            combined,
            VertexStreamMasks::POSITION | VertexStreamMasks::TEXCOORDS
        );
    }
}
