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

//! Enums for pipeline configuration.

/// A comparison function used for depth and stencil tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareFunction {
    /// The test never passes.
    Never,
    /// Passes if the new value is less than the existing value.
    Less,
    /// Passes if the new value equals the existing value.
    Equal,
    /// Passes if the new value is less than or equal to the existing value.
    #[default]
    LessEqual,
    /// Passes if the new value is greater than the existing value.
    Greater,
    /// Passes if the new value differs from the existing value.
    NotEqual,
    /// Passes if the new value is greater than or equal to the existing value.
    GreaterEqual,
    /// The test always passes.
    Always,
}

/// The operation applied to a stencil-buffer value after the stencil test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StencilOperation {
    /// Keep the existing value.
    #[default]
    Keep,
    /// Replace the existing value with the stencil reference.
    Replace,
    /// Increment the existing value, clamping at the maximum.
    IncrementClamp,
    /// Decrement the existing value, clamping at zero.
    DecrementClamp,
    /// Set the value to zero.
    Zero,
    /// Increment the existing value, wrapping on overflow.
    IncrementWrap,
    /// Decrement the existing value, wrapping on underflow.
    DecrementWrap,
    /// Bitwise-invert the existing value.
    Invert,
}

/// A multiplier applied to a blend input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendFactor {
    /// Factor of zero.
    Zero,
    /// Factor of one.
    #[default]
    One,
    /// The source color.
    SrcColor,
    /// One minus the source color.
    OneMinusSrcColor,
    /// The source alpha.
    SrcAlpha,
    /// One minus the source alpha.
    OneMinusSrcAlpha,
    /// The destination color.
    DstColor,
    /// One minus the destination color.
    OneMinusDstColor,
    /// The destination alpha.
    DstAlpha,
    /// One minus the destination alpha.
    OneMinusDstAlpha,
    /// The source alpha, saturated against the destination alpha.
    SrcAlphaSaturate,
    /// The second color output of the fragment shader (dual-source blending).
    Src1Alpha,
    /// One minus the second alpha output of the fragment shader.
    OneMinusSrc1Alpha,
}

/// The operation combining the two weighted blend inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendOperation {
    /// `src * src_factor + dst * dst_factor`
    #[default]
    Add,
    /// `src * src_factor - dst * dst_factor`
    Subtract,
    /// `dst * dst_factor - src * src_factor`
    ReverseSubtract,
    /// `min(src, dst)`
    Min,
    /// `max(src, dst)`
    Max,
}

/// Defines how vertices are connected to form a geometric primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Each vertex is an isolated point.
    PointList,
    /// Every two vertices form a line.
    LineList,
    /// Each vertex after the first extends the line.
    LineStrip,
    /// Every three vertices form a triangle.
    #[default]
    TriangleList,
    /// Each vertex after the first two forms a triangle with its predecessors.
    TriangleStrip,
    /// Control-point patches consumed by the tessellation stages.
    /// The payload is the number of control points per patch.
    PatchList(u8),
}

/// The face culling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    /// Cull front-facing primitives.
    Front,
    /// Cull back-facing primitives.
    Back,
}

/// The rasterization mode for polygons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FillMode {
    /// Rasterize the interior of polygons.
    #[default]
    Solid,
    /// Rasterize polygon edges only.
    Wireframe,
}

/// The subset of resource formats the deferred pipeline renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFormat {
    /// Unspecified format.
    #[default]
    Unknown,
    /// Four 8-bit unsigned normalized components.
    Rgba8Unorm,
    /// Four 8-bit unsigned normalized components in sRGB space.
    Rgba8UnormSrgb,
    /// Four 16-bit float components.
    Rgba16Float,
    /// Two 16-bit float components.
    Rg16Float,
    /// One 32-bit float component.
    R32Float,
    /// 10/10/10/2 unsigned normalized components.
    Rgb10A2Unorm,
    /// 11/11/10 float components.
    Rg11B10Float,
    /// 24-bit depth with 8-bit stencil.
    Depth24PlusStencil8,
    /// 32-bit float depth.
    Depth32Float,
    /// 32-bit float depth with 8-bit stencil.
    Depth32FloatStencil8,
}

impl TextureFormat {
    /// Returns `true` for formats that carry a depth aspect.
    pub fn is_depth(&self) -> bool {
        matches!(
            self,
            TextureFormat::Depth24PlusStencil8
                | TextureFormat::Depth32Float
                | TextureFormat::Depth32FloatStencil8
        )
    }
}

/// The index element size for indexed draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexFormat {
    /// 16-bit unsigned indices.
    #[default]
    Uint16,
    /// 32-bit unsigned indices.
    Uint32,
}
