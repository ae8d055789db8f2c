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

//! State descriptors for the pipeline.

use super::enums::*;
use crate::sable_bitflags;

/// Describes the stencil test and operations for a single face of a primitive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StencilFaceState {
    /// The comparison function used for the stencil test.
    pub compare: CompareFunction,
    /// The operation to perform if the stencil test fails.
    pub fail_op: StencilOperation,
    /// The operation to perform if the stencil test passes but the depth test fails.
    pub depth_fail_op: StencilOperation,
    /// The operation to perform if both the stencil and depth tests pass.
    pub depth_pass_op: StencilOperation,
}

/// Describes depth biasing, used to prevent z-fighting.
#[derive(Debug, Clone, Copy, Default)]
pub struct DepthBiasState {
    /// A constant value added to the depth of each fragment.
    pub constant: i32,
    /// A factor that scales with the fragment's depth slope.
    pub slope_scale: f32,
    /// The maximum bias that can be applied.
    pub clamp: f32,
}

// Compared and hashed by bit pattern so the state can key the PSO cache.
impl PartialEq for DepthBiasState {
    fn eq(&self, other: &Self) -> bool {
        self.constant == other.constant
            && self.slope_scale.to_bits() == other.slope_scale.to_bits()
            && self.clamp.to_bits() == other.clamp.to_bits()
    }
}

impl Eq for DepthBiasState {}

impl std::hash::Hash for DepthBiasState {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.constant.hash(state);
        self.slope_scale.to_bits().hash(state);
        self.clamp.to_bits().hash(state);
    }
}

/// Describes the state for depth and stencil testing.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthStencilStateDescriptor {
    /// If `true`, the depth test is enabled.
    pub depth_test_enabled: bool,
    /// If `true`, depth values will be written to the depth buffer.
    pub depth_write_enabled: bool,
    /// The comparison function used for the depth test.
    pub depth_compare: CompareFunction,
    /// If `true`, the stencil test is enabled.
    pub stencil_enabled: bool,
    /// The stencil state for front-facing primitives.
    pub stencil_front: StencilFaceState,
    /// The stencil state for back-facing primitives.
    pub stencil_back: StencilFaceState,
    /// A bitmask for reading from the stencil buffer.
    pub stencil_read_mask: u32,
    /// A bitmask for writing to the stencil buffer.
    pub stencil_write_mask: u32,
}

impl Default for DepthStencilStateDescriptor {
    fn default() -> Self {
        Self {
            depth_test_enabled: true,
            depth_write_enabled: false,
            depth_compare: CompareFunction::LessEqual,
            stencil_enabled: false,
            stencil_front: StencilFaceState::default(),
            stencil_back: StencilFaceState::default(),
            stencil_read_mask: 0xFF,
            stencil_write_mask: 0xFF,
        }
    }
}

/// Describes a complete blend equation for one component family (color or alpha).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlendComponentDescriptor {
    /// The blend factor for the source value (from the fragment shader).
    pub src_factor: BlendFactor,
    /// The blend factor for the destination value (already in the framebuffer).
    pub dst_factor: BlendFactor,
    /// The operation to combine the source and destination factors.
    pub operation: BlendOperation,
}

sable_bitflags! {
    /// A bitmask to enable or disable writes to individual color channels.
    pub struct ColorWrites: u8 {
        /// Enable writes to the Red channel.
        const R = 0b0001;
        /// Enable writes to the Green channel.
        const G = 0b0010;
        /// Enable writes to the Blue channel.
        const B = 0b0100;
        /// Enable writes to the Alpha channel.
        const A = 0b1000;
        /// Enable writes to all channels.
        const ALL = Self::R.bits() | Self::G.bits() | Self::B.bits() | Self::A.bits();
    }
}

/// Describes the blend state for a color target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlendStateDescriptor {
    /// If `true`, blending is enabled.
    pub enabled: bool,
    /// The blend equation for the RGB color components.
    pub color: BlendComponentDescriptor,
    /// The blend equation for the Alpha component.
    pub alpha: BlendComponentDescriptor,
    /// A bitmask controlling which color channels are written to.
    pub write_mask: ColorWrites,
}

impl Default for BlendStateDescriptor {
    fn default() -> Self {
        Self {
            enabled: false,
            color: BlendComponentDescriptor::default(),
            alpha: BlendComponentDescriptor::default(),
            write_mask: ColorWrites::ALL,
        }
    }
}

/// Describes the state for primitive rasterization.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterizerStateDescriptor {
    /// The rasterization mode for polygons.
    pub fill_mode: FillMode,
    /// The face culling mode, or `None` to rasterize both faces.
    pub cull_mode: Option<CullMode>,
    /// The depth bias state.
    pub bias: DepthBiasState,
}

impl Default for RasterizerStateDescriptor {
    fn default() -> Self {
        Self {
            fill_mode: FillMode::Solid,
            cull_mode: Some(CullMode::Back),
            bias: DepthBiasState::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_depth_stencil_state() {
        let state = DepthStencilStateDescriptor::default();
        assert!(state.depth_test_enabled);
        assert!(!state.depth_write_enabled);
        assert_eq!(state.depth_compare, CompareFunction::LessEqual);
        assert_eq!(state.stencil_read_mask, 0xFF);
    }

    #[test]
    fn test_color_writes_all() {
        assert_eq!(
            ColorWrites::ALL,
            ColorWrites::R | ColorWrites::G | ColorWrites::B | ColorWrites::A
        );
    }
}
