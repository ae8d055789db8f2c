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

//! Helpers for the reversed depth-buffer convention.
//!
//! With reverse depth, 1.0 is near and 0.0 is far, which spreads the
//! floating-point precision of the depth buffer more evenly over the view
//! range. Pass code keeps describing depth in the conventional orientation;
//! these pure transforms remap comparison functions and viewport depth
//! bounds when the active view is reversed.

use super::common::Viewport;
use super::render_state::RenderState;

/// Remaps the depth-function field of a packed render state for reverse depth.
///
/// `LESS` and `GREAT` swap, as do `LEQUAL` and `GEQUAL`. Order-independent
/// functions (`EQUAL`, `NOTEQUAL`, `HIZEQUAL`, `ALWAYS`) pass through
/// untouched. The function is an involution on the remapped set.
pub const fn convert_depth_func(state: RenderState) -> RenderState {
    let func = match state.0 & RenderState::DEPTHFUNC_MASK {
        RenderState::DEPTHFUNC_LESS => RenderState::DEPTHFUNC_GREAT,
        RenderState::DEPTHFUNC_GREAT => RenderState::DEPTHFUNC_LESS,
        RenderState::DEPTHFUNC_LEQUAL => RenderState::DEPTHFUNC_GEQUAL,
        RenderState::DEPTHFUNC_GEQUAL => RenderState::DEPTHFUNC_LEQUAL,
        other => other,
    };
    RenderState((state.0 & !RenderState::DEPTHFUNC_MASK) | func)
}

/// Mirrors a viewport's depth bounds for reverse depth.
///
/// `min' = 1 - max` and `max' = 1 - min`; the spatial rectangle is untouched.
/// Applying the transform twice restores the original bounds.
pub fn convert_viewport(viewport: Viewport) -> Viewport {
    Viewport {
        min_depth: 1.0 - viewport.max_depth,
        max_depth: 1.0 - viewport.min_depth,
        ..viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_depth_func_involution_on_ordered_functions() {
        for func in [
            RenderState::DEPTHFUNC_LESS,
            RenderState::DEPTHFUNC_LEQUAL,
            RenderState::DEPTHFUNC_GREAT,
            RenderState::DEPTHFUNC_GEQUAL,
        ] {
            let state = RenderState(func | RenderState::DEPTHWRITE);
            let once = convert_depth_func(state);
            assert_ne!(once.depth_func_bits(), func);
            assert_eq!(convert_depth_func(once), state);
        }
    }

    #[test]
    fn test_depth_func_identity_on_unordered_functions() {
        for func in [
            RenderState::DEPTHFUNC_EQUAL,
            RenderState::DEPTHFUNC_NOTEQUAL,
            RenderState::DEPTHFUNC_HIZEQUAL,
            RenderState::DEPTHFUNC_ALWAYS,
        ] {
            let state = RenderState(func);
            assert_eq!(convert_depth_func(state), state);
        }
    }

    #[test]
    fn test_less_maps_to_greater() {
        let state = RenderState(RenderState::DEPTHFUNC_LESS);
        assert_eq!(
            convert_depth_func(state).depth_func_bits(),
            RenderState::DEPTHFUNC_GREAT
        );
    }

    #[test]
    fn test_viewport_involution() {
        let viewport = Viewport {
            width: 1920.0,
            height: 1080.0,
            min_depth: 0.2,
            max_depth: 0.8,
            ..Default::default()
        };
        let round_trip = convert_viewport(convert_viewport(viewport));
        assert_relative_eq!(round_trip.min_depth, viewport.min_depth);
        assert_relative_eq!(round_trip.max_depth, viewport.max_depth);
    }

    #[test]
    fn test_full_range_is_identity() {
        let viewport = Viewport {
            min_depth: 0.0,
            max_depth: 1.0,
            ..Default::default()
        };
        let converted = convert_viewport(viewport);
        assert_relative_eq!(converted.min_depth, 0.0);
        assert_relative_eq!(converted.max_depth, 1.0);
    }

    #[test]
    fn test_asymmetric_range_mirrors() {
        let viewport = Viewport {
            min_depth: 0.0,
            max_depth: 0.5,
            ..Default::default()
        };
        let converted = convert_viewport(viewport);
        assert_relative_eq!(converted.min_depth, 0.5);
        assert_relative_eq!(converted.max_depth, 1.0);
    }
}
