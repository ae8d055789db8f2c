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

//! Seams to the material and default-texture collaborators.

use crate::renderer::api::resource::{BufferId, TextureId, TextureSemantic};

/// A material's texture table and constant buffer, as seen by this layer.
pub trait MaterialResources {
    /// The texture the material provides for `semantic`, if any.
    fn texture(&self, semantic: TextureSemantic) -> Option<TextureId>;

    /// The material's per-material constant buffer.
    fn constant_buffer(&self) -> BufferId;
}

/// Engine-supplied fallback textures, one per semantic slot.
pub trait DefaultResources {
    /// The default texture bound when a material leaves `semantic` empty.
    fn default_texture(&self, semantic: TextureSemantic) -> TextureId;
}
