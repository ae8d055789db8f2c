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

//! Small shared types used across the rendering API.

use crate::sable_bitflags;

sable_bitflags! {
    /// The set of shader stages that consume a binding.
    pub struct ShaderStages: u8 {
        /// The vertex stage.
        const VERTEX = 1 << 0;
        /// The hull (tessellation control) stage.
        const HULL = 1 << 1;
        /// The domain (tessellation evaluation) stage.
        const DOMAIN = 1 << 2;
        /// The geometry stage.
        const GEOMETRY = 1 << 3;
        /// The pixel stage.
        const PIXEL = 1 << 4;
        /// The compute stage.
        const COMPUTE = 1 << 5;
        /// All graphics stages.
        const ALL_GRAPHICS = Self::VERTEX.bits()
            | Self::HULL.bits()
            | Self::DOMAIN.bits()
            | Self::GEOMETRY.bits()
            | Self::PIXEL.bits();
    }
}

impl ShaderStages {
    /// The number of distinct stages a binding can target.
    pub const STAGE_COUNT: usize = 6;

    /// Iterates the indices of the stages present in the mask.
    ///
    /// Stage indices follow the bit order of the flags (vertex = 0,
    /// compute = 5) and index the per-stage arrays the immediate backend
    /// builds.
    pub fn stage_indices(self) -> impl Iterator<Item = usize> {
        (0..Self::STAGE_COUNT).filter(move |i| self.bits() & (1 << i) != 0)
    }
}

/// A viewport rectangle with a depth range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Left edge in pixels.
    pub x: f32,
    /// Top edge in pixels.
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
    /// Near end of the depth range, in `[0, 1]`.
    pub min_depth: f32,
    /// Far end of the depth range, in `[0, 1]`.
    pub max_depth: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_indices_follow_bit_order() {
        let stages = ShaderStages::VERTEX | ShaderStages::PIXEL;
        let indices: Vec<usize> = stages.stage_indices().collect();
        assert_eq!(indices, vec![0, 4]);
    }
}
