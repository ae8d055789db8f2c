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

//! The packed render-state and stencil-state words and their decoding.
//!
//! Material and pass code describes fixed-function state as one `u32` word
//! ([`RenderState`]) plus one `u32` stencil word ([`StencilState`]).
//! [`decode_render_state`] maps the packed words deterministically into the
//! descriptor structs both backends compile from. The decode is part of the
//! pipeline-state descriptor contract: equal words decode equally, so the
//! pipeline cache can key on the words themselves.

use super::pipeline::enums::*;
use super::pipeline::state::*;
use super::reverse_depth;

/// A packed fixed-function render-state word.
///
/// Sub-fields (blend factors, depth function, color mask) live at fixed
/// bit positions; the associated constants below are the only way pass code
/// should compose a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RenderState(pub u32);

impl RenderState {
    /// Mask of the blend source-factor field.
    pub const BLSRC_MASK: u32 = 0x0000000F;
    /// Source factor: zero.
    pub const BLSRC_ZERO: u32 = 0x1;
    /// Source factor: one.
    pub const BLSRC_ONE: u32 = 0x2;
    /// Source factor: destination color (destination alpha on the alpha channel).
    pub const BLSRC_DSTCOL: u32 = 0x3;
    /// Source factor: one minus destination color.
    pub const BLSRC_ONEMINUSDSTCOL: u32 = 0x4;
    /// Source factor: source alpha.
    pub const BLSRC_SRCALPHA: u32 = 0x5;
    /// Source factor: one minus source alpha.
    pub const BLSRC_ONEMINUSSRCALPHA: u32 = 0x6;
    /// Source factor: destination alpha.
    pub const BLSRC_DSTALPHA: u32 = 0x7;
    /// Source factor: one minus destination alpha.
    pub const BLSRC_ONEMINUSDSTALPHA: u32 = 0x8;
    /// Source factor: saturated source alpha.
    pub const BLSRC_ALPHASATURATE: u32 = 0x9;
    /// Source factor: source alpha for color, zero for alpha.
    pub const BLSRC_SRCALPHA_A_ZERO: u32 = 0xA;
    /// Source factor: second fragment-shader alpha output.
    pub const BLSRC_SRC1ALPHA: u32 = 0xB;

    /// Mask of the blend destination-factor field.
    pub const BLDST_MASK: u32 = 0x000000F0;
    /// Destination factor: zero.
    pub const BLDST_ZERO: u32 = 0x10;
    /// Destination factor: one.
    pub const BLDST_ONE: u32 = 0x20;
    /// Destination factor: source color (source alpha on the alpha channel).
    pub const BLDST_SRCCOL: u32 = 0x30;
    /// Destination factor: one minus source color.
    pub const BLDST_ONEMINUSSRCCOL: u32 = 0x40;
    /// Destination factor: source alpha.
    pub const BLDST_SRCALPHA: u32 = 0x50;
    /// Destination factor: one minus source alpha.
    pub const BLDST_ONEMINUSSRCALPHA: u32 = 0x60;
    /// Destination factor: destination alpha.
    pub const BLDST_DSTALPHA: u32 = 0x70;
    /// Destination factor: one minus destination alpha.
    pub const BLDST_ONEMINUSDSTALPHA: u32 = 0x80;
    /// Destination factor: one for color, zero for alpha.
    pub const BLDST_ONE_A_ZERO: u32 = 0x90;
    /// Destination factor: one minus the second fragment-shader alpha output.
    pub const BLDST_ONEMINUSSRC1ALPHA: u32 = 0xA0;

    /// Enables depth writes.
    pub const DEPTHWRITE: u32 = 0x00000100;
    /// Rasterizes polygon edges only.
    pub const WIREFRAME: u32 = 0x00000200;
    /// Disables the depth test.
    pub const NODEPTHTEST: u32 = 0x00000400;
    /// Enables the stencil test.
    pub const STENCIL: u32 = 0x00000800;

    /// Mask of the depth-function field.
    pub const DEPTHFUNC_MASK: u32 = 0x00700000;
    /// Depth passes when less than or equal.
    pub const DEPTHFUNC_LEQUAL: u32 = 0x00000000;
    /// Depth passes when equal.
    pub const DEPTHFUNC_EQUAL: u32 = 0x00100000;
    /// Depth passes when greater.
    pub const DEPTHFUNC_GREAT: u32 = 0x00200000;
    /// Depth passes when less.
    pub const DEPTHFUNC_LESS: u32 = 0x00300000;
    /// Depth passes when greater than or equal.
    pub const DEPTHFUNC_GEQUAL: u32 = 0x00400000;
    /// Depth passes when not equal.
    pub const DEPTHFUNC_NOTEQUAL: u32 = 0x00500000;
    /// Depth passes when equal, hinted for hierarchical-Z equality passes.
    pub const DEPTHFUNC_HIZEQUAL: u32 = 0x00600000;
    /// Depth always passes.
    pub const DEPTHFUNC_ALWAYS: u32 = 0x00700000;

    /// Mask of the blend-operation field.
    pub const BLOP_MASK: u32 = 0x01800000;
    /// Blend operation: max.
    pub const BLOP_MAX: u32 = 0x00800000;
    /// Blend operation: min.
    pub const BLOP_MIN: u32 = 0x01000000;

    /// Mask of the separate-alpha blend field.
    pub const BLALPHA_MASK: u32 = 0x06000000;
    /// Blended alpha output: min of source and destination alpha.
    pub const BLALPHA_MIN: u32 = 0x02000000;
    /// Blended alpha output: max of source and destination alpha.
    pub const BLALPHA_MAX: u32 = 0x04000000;

    /// Mask of the inverted color-write nibble.
    pub const COLMASK_MASK: u32 = 0x78000000;
    /// Shift of the inverted color-write nibble.
    pub const COLMASK_SHIFT: u32 = 27;

    /// Mask of every field that participates in blending. Blending is
    /// enabled if and only if any of these bits are set.
    pub const BLEND_MASK: u32 =
        Self::BLSRC_MASK | Self::BLDST_MASK | Self::BLOP_MASK | Self::BLALPHA_MASK;

    /// Returns `true` if any blend field is set.
    pub const fn blending_enabled(&self) -> bool {
        (self.0 & Self::BLEND_MASK) != 0
    }

    /// Returns the raw depth-function field.
    pub const fn depth_func_bits(&self) -> u32 {
        self.0 & Self::DEPTHFUNC_MASK
    }
}

/// A packed stencil-state word.
///
/// Front-face function and operations occupy the low 16 bits; when the
/// two-sided bit is set, the back-face fields occupy the same layout shifted
/// by [`StencilState::CCW_SHIFT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StencilState(pub u32);

impl StencilState {
    /// Mask of a stencil-function field.
    pub const FUNC_MASK: u32 = 0x7;
    /// Stencil function: always.
    pub const FUNC_ALWAYS: u32 = 0x0;
    /// Stencil function: never.
    pub const FUNC_NEVER: u32 = 0x1;
    /// Stencil function: less.
    pub const FUNC_LESS: u32 = 0x2;
    /// Stencil function: less or equal.
    pub const FUNC_LEQUAL: u32 = 0x3;
    /// Stencil function: greater.
    pub const FUNC_GREATER: u32 = 0x4;
    /// Stencil function: greater or equal.
    pub const FUNC_GEQUAL: u32 = 0x5;
    /// Stencil function: equal.
    pub const FUNC_EQUAL: u32 = 0x6;
    /// Stencil function: not equal.
    pub const FUNC_NOTEQUAL: u32 = 0x7;

    /// Stencil operation: keep.
    pub const OP_KEEP: u32 = 0x0;
    /// Stencil operation: replace with the reference.
    pub const OP_REPLACE: u32 = 0x1;
    /// Stencil operation: saturating increment.
    pub const OP_INCR: u32 = 0x2;
    /// Stencil operation: saturating decrement.
    pub const OP_DECR: u32 = 0x3;
    /// Stencil operation: zero.
    pub const OP_ZERO: u32 = 0x4;
    /// Stencil operation: wrapping increment.
    pub const OP_INCR_WRAP: u32 = 0x5;
    /// Stencil operation: wrapping decrement.
    pub const OP_DECR_WRAP: u32 = 0x6;
    /// Stencil operation: invert.
    pub const OP_INVERT: u32 = 0x7;

    /// Shift of the fail-operation field.
    pub const FAIL_SHIFT: u32 = 4;
    /// Shift of the depth-fail-operation field.
    pub const ZFAIL_SHIFT: u32 = 8;
    /// Shift of the pass-operation field.
    pub const PASS_SHIFT: u32 = 12;
    /// Two-sided stencil: back-face fields are taken from the high bits.
    pub const TWOSIDED: u32 = 0x8000;
    /// Shift applied to the whole layout for back-face fields.
    pub const CCW_SHIFT: u32 = 16;

    /// Composes a front-face stencil word from function and operations.
    pub const fn front(func: u32, fail: u32, zfail: u32, pass: u32) -> Self {
        Self(
            (func & Self::FUNC_MASK)
                | ((fail & Self::FUNC_MASK) << Self::FAIL_SHIFT)
                | ((zfail & Self::FUNC_MASK) << Self::ZFAIL_SHIFT)
                | ((pass & Self::FUNC_MASK) << Self::PASS_SHIFT),
        )
    }

    /// Composes a two-sided stencil word from separate front and back states.
    pub const fn two_sided(front: Self, back: Self) -> Self {
        Self(front.0 | Self::TWOSIDED | (back.0 << Self::CCW_SHIFT))
    }
}

// Lookup table order is the wire order of the packed function field.
const STENCIL_FUNC_LOOKUP: [CompareFunction; 8] = [
    CompareFunction::Always,
    CompareFunction::Never,
    CompareFunction::Less,
    CompareFunction::LessEqual,
    CompareFunction::Greater,
    CompareFunction::GreaterEqual,
    CompareFunction::Equal,
    CompareFunction::NotEqual,
];

const STENCIL_OP_LOOKUP: [StencilOperation; 8] = [
    StencilOperation::Keep,
    StencilOperation::Replace,
    StencilOperation::IncrementClamp,
    StencilOperation::DecrementClamp,
    StencilOperation::Zero,
    StencilOperation::IncrementWrap,
    StencilOperation::DecrementWrap,
    StencilOperation::Invert,
];

/// The fixed-function state blocks produced by [`decode_render_state`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedRenderState {
    /// Blend state for the color targets.
    pub blend: BlendStateDescriptor,
    /// Depth and stencil state.
    pub depth_stencil: DepthStencilStateDescriptor,
    /// Rasterizer state. Cull mode and depth bias are not part of the packed
    /// word; the pipeline descriptor patches them in after decoding.
    pub rasterizer: RasterizerStateDescriptor,
}

fn decode_blend_src(field: u32) -> (BlendFactor, BlendFactor) {
    match field {
        RenderState::BLSRC_ZERO => (BlendFactor::Zero, BlendFactor::Zero),
        RenderState::BLSRC_ONE => (BlendFactor::One, BlendFactor::One),
        RenderState::BLSRC_DSTCOL => (BlendFactor::DstColor, BlendFactor::DstAlpha),
        RenderState::BLSRC_ONEMINUSDSTCOL => {
            (BlendFactor::OneMinusDstColor, BlendFactor::OneMinusDstAlpha)
        }
        RenderState::BLSRC_SRCALPHA => (BlendFactor::SrcAlpha, BlendFactor::SrcAlpha),
        RenderState::BLSRC_ONEMINUSSRCALPHA => {
            (BlendFactor::OneMinusSrcAlpha, BlendFactor::OneMinusSrcAlpha)
        }
        RenderState::BLSRC_DSTALPHA => (BlendFactor::DstAlpha, BlendFactor::DstAlpha),
        RenderState::BLSRC_ONEMINUSDSTALPHA => {
            (BlendFactor::OneMinusDstAlpha, BlendFactor::OneMinusDstAlpha)
        }
        RenderState::BLSRC_ALPHASATURATE => {
            (BlendFactor::SrcAlphaSaturate, BlendFactor::SrcAlphaSaturate)
        }
        RenderState::BLSRC_SRCALPHA_A_ZERO => (BlendFactor::SrcAlpha, BlendFactor::Zero),
        RenderState::BLSRC_SRC1ALPHA => (BlendFactor::Src1Alpha, BlendFactor::Src1Alpha),
        _ => (BlendFactor::One, BlendFactor::One),
    }
}

fn decode_blend_dst(field: u32) -> (BlendFactor, BlendFactor) {
    match field {
        RenderState::BLDST_ZERO => (BlendFactor::Zero, BlendFactor::Zero),
        RenderState::BLDST_ONE => (BlendFactor::One, BlendFactor::One),
        RenderState::BLDST_SRCCOL => (BlendFactor::SrcColor, BlendFactor::SrcAlpha),
        RenderState::BLDST_ONEMINUSSRCCOL => {
            (BlendFactor::OneMinusSrcColor, BlendFactor::OneMinusSrcAlpha)
        }
        RenderState::BLDST_SRCALPHA => (BlendFactor::SrcAlpha, BlendFactor::SrcAlpha),
        RenderState::BLDST_ONEMINUSSRCALPHA => {
            (BlendFactor::OneMinusSrcAlpha, BlendFactor::OneMinusSrcAlpha)
        }
        RenderState::BLDST_DSTALPHA => (BlendFactor::DstAlpha, BlendFactor::DstAlpha),
        RenderState::BLDST_ONEMINUSDSTALPHA => {
            (BlendFactor::OneMinusDstAlpha, BlendFactor::OneMinusDstAlpha)
        }
        RenderState::BLDST_ONE_A_ZERO => (BlendFactor::One, BlendFactor::Zero),
        RenderState::BLDST_ONEMINUSSRC1ALPHA => {
            (BlendFactor::OneMinusSrc1Alpha, BlendFactor::OneMinusSrc1Alpha)
        }
        _ => (BlendFactor::Zero, BlendFactor::Zero),
    }
}

fn decode_blend(state: RenderState) -> BlendStateDescriptor {
    let mut blend = BlendStateDescriptor {
        enabled: state.blending_enabled(),
        ..Default::default()
    };

    // The stored nibble is the complement of the write mask; a zero field
    // means "write all channels".
    let inv_mask = (state.0 & RenderState::COLMASK_MASK) >> RenderState::COLMASK_SHIFT;
    blend.write_mask = ColorWrites::from_bits_truncate((!inv_mask as u8) & 0xF);

    if !blend.enabled {
        return blend;
    }

    let (src_color, src_alpha) = decode_blend_src(state.0 & RenderState::BLSRC_MASK);
    let (dst_color, dst_alpha) = decode_blend_dst(state.0 & RenderState::BLDST_MASK);
    blend.color.src_factor = src_color;
    blend.color.dst_factor = dst_color;
    blend.alpha.src_factor = src_alpha;
    blend.alpha.dst_factor = dst_alpha;

    let (op, alpha_op) = match state.0 & RenderState::BLOP_MASK {
        RenderState::BLOP_MAX => (BlendOperation::Max, BlendOperation::Max),
        RenderState::BLOP_MIN => (BlendOperation::Min, BlendOperation::Min),
        _ => (BlendOperation::Add, BlendOperation::Add),
    };
    blend.color.operation = op;
    blend.alpha.operation = alpha_op;

    // Blended-alpha output overrides the table-derived alpha equation
    // entirely; both factors become ONE.
    match state.0 & RenderState::BLALPHA_MASK {
        RenderState::BLALPHA_MIN => {
            blend.alpha = BlendComponentDescriptor {
                src_factor: BlendFactor::One,
                dst_factor: BlendFactor::One,
                operation: BlendOperation::Min,
            };
        }
        RenderState::BLALPHA_MAX => {
            blend.alpha = BlendComponentDescriptor {
                src_factor: BlendFactor::One,
                dst_factor: BlendFactor::One,
                operation: BlendOperation::Max,
            };
        }
        _ => {}
    }

    blend
}

fn decode_depth_func(bits: u32) -> CompareFunction {
    match bits {
        RenderState::DEPTHFUNC_LEQUAL => CompareFunction::LessEqual,
        RenderState::DEPTHFUNC_EQUAL => CompareFunction::Equal,
        RenderState::DEPTHFUNC_GREAT => CompareFunction::Greater,
        RenderState::DEPTHFUNC_LESS => CompareFunction::Less,
        RenderState::DEPTHFUNC_GEQUAL => CompareFunction::GreaterEqual,
        RenderState::DEPTHFUNC_NOTEQUAL => CompareFunction::NotEqual,
        RenderState::DEPTHFUNC_HIZEQUAL => CompareFunction::Equal,
        _ => CompareFunction::Always,
    }
}

fn decode_stencil_face(word: u32) -> StencilFaceState {
    StencilFaceState {
        compare: STENCIL_FUNC_LOOKUP[(word & StencilState::FUNC_MASK) as usize],
        fail_op: STENCIL_OP_LOOKUP
            [((word >> StencilState::FAIL_SHIFT) & StencilState::FUNC_MASK) as usize],
        depth_fail_op: STENCIL_OP_LOOKUP
            [((word >> StencilState::ZFAIL_SHIFT) & StencilState::FUNC_MASK) as usize],
        depth_pass_op: STENCIL_OP_LOOKUP
            [((word >> StencilState::PASS_SHIFT) & StencilState::FUNC_MASK) as usize],
    }
}

/// Decodes the packed state words into backend-consumable descriptors.
///
/// When `reverse_depth` is set, the depth comparison is remapped through
/// [`reverse_depth::convert_depth_func`] so pass code can keep describing
/// depth in the conventional 0-near convention.
pub fn decode_render_state(
    render_state: RenderState,
    stencil_state: StencilState,
    stencil_read_mask: u32,
    stencil_write_mask: u32,
    reverse_depth: bool,
) -> DecodedRenderState {
    let depth_state = if reverse_depth {
        reverse_depth::convert_depth_func(render_state)
    } else {
        render_state
    };

    let stencil_front = decode_stencil_face(stencil_state.0);
    let stencil_back = if stencil_state.0 & StencilState::TWOSIDED != 0 {
        decode_stencil_face(stencil_state.0 >> StencilState::CCW_SHIFT)
    } else {
        stencil_front
    };

    DecodedRenderState {
        blend: decode_blend(render_state),
        depth_stencil: DepthStencilStateDescriptor {
            depth_test_enabled: render_state.0 & RenderState::NODEPTHTEST == 0,
            depth_write_enabled: render_state.0 & RenderState::DEPTHWRITE != 0,
            depth_compare: decode_depth_func(depth_state.depth_func_bits()),
            stencil_enabled: render_state.0 & RenderState::STENCIL != 0,
            stencil_front,
            stencil_back,
            stencil_read_mask,
            stencil_write_mask,
        },
        rasterizer: RasterizerStateDescriptor {
            fill_mode: if render_state.0 & RenderState::WIREFRAME != 0 {
                FillMode::Wireframe
            } else {
                FillMode::Solid
            },
            cull_mode: Some(CullMode::Back),
            bias: DepthBiasState::default(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opaque_state_disables_blending() {
        let decoded = decode_render_state(
            RenderState(RenderState::DEPTHWRITE),
            StencilState::default(),
            0xFF,
            0xFF,
            false,
        );
        assert!(!decoded.blend.enabled);
        assert!(decoded.depth_stencil.depth_write_enabled);
        assert_eq!(decoded.depth_stencil.depth_compare, CompareFunction::LessEqual);
        assert_eq!(decoded.blend.write_mask, ColorWrites::ALL);
    }

    #[test]
    fn test_additive_blend_decode() {
        let state = RenderState(RenderState::BLSRC_ONE | RenderState::BLDST_ONE);
        let decoded =
            decode_render_state(state, StencilState::default(), 0xFF, 0xFF, false);
        assert!(decoded.blend.enabled);
        assert_eq!(decoded.blend.color.src_factor, BlendFactor::One);
        assert_eq!(decoded.blend.color.dst_factor, BlendFactor::One);
        assert_eq!(decoded.blend.color.operation, BlendOperation::Add);
    }

    #[test]
    fn test_srccol_dst_maps_alpha_to_srcalpha() {
        let state = RenderState(RenderState::BLSRC_ONE | RenderState::BLDST_SRCCOL);
        let decoded =
            decode_render_state(state, StencilState::default(), 0xFF, 0xFF, false);
        assert_eq!(decoded.blend.color.dst_factor, BlendFactor::SrcColor);
        assert_eq!(decoded.blend.alpha.dst_factor, BlendFactor::SrcAlpha);
    }

    #[test]
    fn test_blended_alpha_output_forces_one_factors() {
        let state = RenderState(
            RenderState::BLSRC_SRCALPHA
                | RenderState::BLDST_ONEMINUSSRCALPHA
                | RenderState::BLALPHA_MAX,
        );
        let decoded =
            decode_render_state(state, StencilState::default(), 0xFF, 0xFF, false);
        assert_eq!(decoded.blend.alpha.src_factor, BlendFactor::One);
        assert_eq!(decoded.blend.alpha.dst_factor, BlendFactor::One);
        assert_eq!(decoded.blend.alpha.operation, BlendOperation::Max);
        // The color equation keeps the table lookup.
        assert_eq!(decoded.blend.color.src_factor, BlendFactor::SrcAlpha);
        assert_eq!(decoded.blend.color.dst_factor, BlendFactor::OneMinusSrcAlpha);
    }

    #[test]
    fn test_color_mask_nibble_is_inverted() {
        // Storing 0b1000 masks out alpha, leaving RGB.
        let state = RenderState(0b1000 << RenderState::COLMASK_SHIFT);
        let decoded =
            decode_render_state(state, StencilState::default(), 0xFF, 0xFF, false);
        assert_eq!(
            decoded.blend.write_mask,
            ColorWrites::R | ColorWrites::G | ColorWrites::B
        );
    }

    #[test]
    fn test_one_sided_stencil_mirrors_front_face() {
        let stencil = StencilState::front(
            StencilState::FUNC_NOTEQUAL,
            StencilState::OP_KEEP,
            StencilState::OP_REPLACE,
            StencilState::OP_REPLACE,
        );
        let decoded = decode_render_state(
            RenderState(RenderState::STENCIL),
            stencil,
            0xFF,
            0xFF,
            false,
        );
        assert!(decoded.depth_stencil.stencil_enabled);
        assert_eq!(
            decoded.depth_stencil.stencil_front.compare,
            CompareFunction::NotEqual
        );
        assert_eq!(
            decoded.depth_stencil.stencil_front,
            decoded.depth_stencil.stencil_back
        );
    }

    #[test]
    fn test_two_sided_stencil_reads_high_bits() {
        let front = StencilState::front(
            StencilState::FUNC_LESS,
            StencilState::OP_KEEP,
            StencilState::OP_KEEP,
            StencilState::OP_INCR,
        );
        let back = StencilState::front(
            StencilState::FUNC_GREATER,
            StencilState::OP_KEEP,
            StencilState::OP_KEEP,
            StencilState::OP_DECR,
        );
        let decoded = decode_render_state(
            RenderState(RenderState::STENCIL),
            StencilState::two_sided(front, back),
            0xFF,
            0xFF,
            false,
        );
        assert_eq!(decoded.depth_stencil.stencil_front.compare, CompareFunction::Less);
        assert_eq!(
            decoded.depth_stencil.stencil_front.depth_pass_op,
            StencilOperation::IncrementClamp
        );
        assert_eq!(decoded.depth_stencil.stencil_back.compare, CompareFunction::Greater);
        assert_eq!(
            decoded.depth_stencil.stencil_back.depth_pass_op,
            StencilOperation::DecrementClamp
        );
    }

    #[test]
    fn test_reverse_depth_remaps_comparison() {
        let state = RenderState(RenderState::DEPTHFUNC_LESS);
        let normal = decode_render_state(state, StencilState::default(), 0xFF, 0xFF, false);
        let reversed = decode_render_state(state, StencilState::default(), 0xFF, 0xFF, true);
        assert_eq!(normal.depth_stencil.depth_compare, CompareFunction::Less);
        assert_eq!(reversed.depth_stencil.depth_compare, CompareFunction::Greater);
    }
}
