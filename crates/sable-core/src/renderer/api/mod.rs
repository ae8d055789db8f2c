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

//! Backend-agnostic pipeline and binding API.
//!
//! Organized into several logical sub-modules:
//!
//! - **[`pipeline`]**: Fixed-function state enums and unpacked descriptors.
//! - **[`render_state`]**: The packed render/stencil state words and their
//!   deterministic decode.
//! - **[`reverse_depth`]**: Pure transforms for reversed-depth views.
//! - **[`resource`]**: Opaque handles, view selectors, sampler state.
//! - **[`resource_set`]**: Slot-to-resource binding tables with dirty
//!   tracking.
//! - **[`layout`]**: Binding-interface declarations and their validation.
//! - **[`pso`]**: The hashable pipeline descriptor keying the PSO cache.
//! - **[`invalidation`]**: Texture-to-resource-set invalidation registry.
//! - **[`stats`]**: Command-list profiling counters.

pub mod common;
pub mod invalidation;
pub mod layout;
pub mod pipeline;
pub mod pso;
pub mod render_state;
pub mod resource;
pub mod resource_set;
pub mod reverse_depth;
pub mod stats;

pub use self::common::{ShaderStages, Viewport};
pub use self::invalidation::{InvalidationRegistry, ResourceSetToken};
pub use self::layout::{LayoutBinding, LayoutEntry, ResourceLayoutDesc, ResourceSetLayout};
pub use self::pso::{
    combine_vertex_stream_masks, DrawDescription, GraphicsPsoDescriptor, VertexFormatId,
    VertexStreamMasks, MAX_RENDER_TARGETS,
};
pub use self::render_state::{decode_render_state, DecodedRenderState, RenderState, StencilState};
pub use self::resource::{
    AddressMode, BufferId, FilterMode, ResourceLayoutId, SamplerId, SamplerStateDesc, ShaderId,
    TextureId, TextureSemantic, TextureViewKey, PER_MATERIAL_CB_SLOT,
};
pub use self::resource_set::{BindingPolicy, ResourceSet};
pub use self::reverse_depth::{convert_depth_func, convert_viewport};
pub use self::stats::{primitive_count, CommandListStats};
