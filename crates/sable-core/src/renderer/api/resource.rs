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

//! Opaque resource handles, view selectors and sampler descriptions.
//!
//! Texture and buffer contents are owned by out-of-scope collaborators; this
//! layer only routes handles into shader binding slots.

/// An opaque handle to a texture owned by the texture system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub usize);

/// An opaque handle to a GPU buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub usize);

/// An opaque handle to a sampler-state object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SamplerId(pub usize);

/// An opaque handle to a shader owned by the shader system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(pub usize);

/// An opaque handle to a built resource layout, assigned by the device
/// context. Pipeline descriptors reference layouts by this identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceLayoutId(pub usize);

/// Selects which view of a texture a binding resolves to.
///
/// One texture can expose several shader-resource views (the multisampled
/// and resolved views of a render target, an sRGB reinterpretation, a single
/// mip). The view key travels with the binding and is resolved at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureViewKey {
    /// The texture's default shader-resource view.
    #[default]
    Default,
    /// The sRGB reinterpretation of the default view.
    Srgb,
    /// The multisampled view of a render target.
    Msaa,
    /// A raw typeless view.
    Raw,
    /// The depth aspect of a depth-stencil texture.
    DepthOnly,
    /// The stencil aspect of a depth-stencil texture.
    StencilOnly,
    /// A single mip level.
    Mip(u8),
}

/// Texture filtering used by a sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Nearest-neighbor filtering.
    Point,
    /// Linear interpolation.
    #[default]
    Linear,
    /// Anisotropic filtering.
    Anisotropic,
}

/// Addressing mode for texture coordinates outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    /// Coordinates wrap around.
    #[default]
    Wrap,
    /// Coordinates are clamped to the edge.
    Clamp,
    /// Coordinates mirror on each repetition.
    Mirror,
    /// Out-of-range samples return the border color.
    Border,
}

/// The full state of a sampler object.
///
/// Also used verbatim as a static-sampler description when the explicit
/// backend bakes resource-set samplers into the root signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SamplerStateDesc {
    /// Minification/magnification filtering.
    pub filter: FilterMode,
    /// Addressing on the U axis.
    pub address_u: AddressMode,
    /// Addressing on the V axis.
    pub address_v: AddressMode,
    /// Addressing on the W axis.
    pub address_w: AddressMode,
    /// Maximum anisotropy, meaningful with [`FilterMode::Anisotropic`].
    pub anisotropy: u8,
    /// Comparison sampler (shadow lookups) when set.
    pub comparison: Option<super::pipeline::enums::CompareFunction>,
}

/// The material texture semantics the deferred pipeline understands.
///
/// Each semantic owns a fixed shader slot; `ResourceSet::fill` binds one
/// texture per semantic, falling back to an engine default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum TextureSemantic {
    /// Base color.
    Diffuse,
    /// Tangent-space normals.
    Normals,
    /// Specular color/reflectance.
    Specular,
    /// Environment probe.
    Environment,
    /// Detail overlay.
    Detail,
    /// Secondary smoothness.
    SecondSmoothness,
    /// Height/displacement.
    Height,
    /// Decal overlay.
    DecalOverlay,
    /// Subsurface scattering map.
    Subsurface,
    /// First custom slot.
    Custom,
    /// Second custom slot.
    CustomSecondary,
    /// Opacity map.
    Opacity,
    /// Emittance map.
    Emittance,
    /// Ambient occlusion.
    Occlusion,
}

impl TextureSemantic {
    /// Every semantic, in shader-slot order.
    pub const ALL: [TextureSemantic; 14] = [
        TextureSemantic::Diffuse,
        TextureSemantic::Normals,
        TextureSemantic::Specular,
        TextureSemantic::Environment,
        TextureSemantic::Detail,
        TextureSemantic::SecondSmoothness,
        TextureSemantic::Height,
        TextureSemantic::DecalOverlay,
        TextureSemantic::Subsurface,
        TextureSemantic::Custom,
        TextureSemantic::CustomSecondary,
        TextureSemantic::Opacity,
        TextureSemantic::Emittance,
        TextureSemantic::Occlusion,
    ];

    /// The fixed shader slot this semantic binds to.
    pub const fn shader_slot(&self) -> u32 {
        *self as u32
    }
}

/// The shader slot reserved for the per-material constant buffer.
pub const PER_MATERIAL_CB_SLOT: u32 = 3;
