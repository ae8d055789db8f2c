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

//! Profiling counters recorded while a command list is built.

use super::pipeline::enums::PrimitiveTopology;

/// The number of primitives assembled from `vertex_count` vertices (or
/// indices) under `topology`.
///
/// Strips subtract their priming vertices, lists divide by the primitive
/// arity, point and patch topologies pass the count through. Degenerate
/// counts floor at zero.
pub fn primitive_count(topology: PrimitiveTopology, vertex_count: u32) -> u32 {
    match topology {
        PrimitiveTopology::PointList => vertex_count,
        PrimitiveTopology::LineList => vertex_count / 2,
        PrimitiveTopology::LineStrip => vertex_count.saturating_sub(1),
        PrimitiveTopology::TriangleList => vertex_count / 3,
        PrimitiveTopology::TriangleStrip => vertex_count.saturating_sub(2),
        PrimitiveTopology::PatchList(_) => vertex_count,
    }
}

/// Per-command-list profiling counters.
///
/// Purely observational: nothing in the binding model reads these back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandListStats {
    /// Draw calls recorded.
    pub draw_calls: u32,
    /// Compute dispatches recorded.
    pub dispatches: u32,
    /// Copy operations recorded.
    pub copies: u32,
    /// Primitives submitted, accounted per topology.
    pub primitives: u64,
}

impl CommandListStats {
    /// Records one draw of `vertex_count` vertices under `topology`.
    pub fn record_draw(&mut self, topology: PrimitiveTopology, vertex_count: u32, instances: u32) {
        self.draw_calls += 1;
        self.primitives += u64::from(primitive_count(topology, vertex_count)) * u64::from(instances);
    }

    /// Records one compute dispatch.
    pub fn record_dispatch(&mut self) {
        self.dispatches += 1;
    }

    /// Records one copy operation.
    pub fn record_copy(&mut self) {
        self.copies += 1;
    }

    /// Resets every counter to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_list_accounting() {
        assert_eq!(primitive_count(PrimitiveTopology::TriangleList, 300), 100);
    }

    #[test]
    fn test_triangle_strip_accounting() {
        assert_eq!(primitive_count(PrimitiveTopology::TriangleStrip, 300), 298);
    }

    #[test]
    fn test_line_accounting() {
        assert_eq!(primitive_count(PrimitiveTopology::LineList, 300), 150);
        assert_eq!(primitive_count(PrimitiveTopology::LineStrip, 300), 299);
    }

    #[test]
    fn test_passthrough_topologies() {
        assert_eq!(primitive_count(PrimitiveTopology::PointList, 17), 17);
        assert_eq!(primitive_count(PrimitiveTopology::PatchList(3), 17), 17);
    }

    #[test]
    fn test_degenerate_counts_floor_at_zero() {
        assert_eq!(primitive_count(PrimitiveTopology::TriangleStrip, 1), 0);
        assert_eq!(primitive_count(PrimitiveTopology::LineStrip, 0), 0);
    }

    #[test]
    fn test_record_draw_scales_by_instances() {
        let mut stats = CommandListStats::default();
        stats.record_draw(PrimitiveTopology::TriangleList, 300, 4);
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(stats.primitives, 400);
    }
}
