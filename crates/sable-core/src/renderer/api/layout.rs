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

//! Resource layouts: the pipeline's binding interface declaration.
//!
//! A layout declares what kinds of bindings occupy each bind slot of a
//! pipeline: inline constants, a resource set, or a single constant buffer.
//! The explicit backend compiles it into a root-signature equivalent; the
//! immediate backend only validates it.

use super::common::ShaderStages;
use super::resource::SamplerStateDesc;
use super::resource_set::ResourceSet;
use crate::renderer::error::LayoutError;

/// A snapshot of one binding inside a layout's resource-set entry.
///
/// The layout captures shader slot and stage information at declaration
/// time; the resources themselves stay with the live [`ResourceSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutBinding {
    /// The shader slot the binding occupies.
    pub shader_slot: u32,
    /// The stages that consume the binding.
    pub stages: ShaderStages,
}

/// The layout-side snapshot of a resource set's shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceSetLayout {
    /// Texture (SRV) bindings, in slot order.
    pub textures: Vec<LayoutBinding>,
    /// Sampler bindings with their baked state, in slot order.
    pub samplers: Vec<(LayoutBinding, SamplerStateDesc)>,
    /// Constant-buffer bindings, in slot order.
    pub constant_buffers: Vec<LayoutBinding>,
    /// Raw-buffer bindings, in slot order.
    pub buffers: Vec<LayoutBinding>,
}

impl ResourceSetLayout {
    fn from_set(set: &ResourceSet) -> Self {
        Self {
            textures: set
                .textures()
                .iter()
                .map(|(&slot, b)| LayoutBinding {
                    shader_slot: slot,
                    stages: b.stages,
                })
                .collect(),
            samplers: set
                .samplers()
                .iter()
                .map(|(&slot, b)| {
                    (
                        LayoutBinding {
                            shader_slot: slot,
                            stages: b.stages,
                        },
                        b.state,
                    )
                })
                .collect(),
            constant_buffers: set
                .constant_buffers()
                .iter()
                .map(|(&slot, b)| LayoutBinding {
                    shader_slot: slot,
                    stages: b.stages,
                })
                .collect(),
            buffers: set
                .buffers()
                .iter()
                .map(|(&slot, b)| LayoutBinding {
                    shader_slot: slot,
                    stages: b.stages,
                })
                .collect(),
        }
    }

    fn bindings(&self) -> impl Iterator<Item = &LayoutBinding> {
        self.textures
            .iter()
            .chain(self.samplers.iter().map(|(b, _)| b))
            .chain(self.constant_buffers.iter())
            .chain(self.buffers.iter())
    }
}

/// What a single bind slot of a layout holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutEntry {
    /// Inline constants pushed directly through the command list,
    /// `count` 32-bit values wide.
    InlineConstants {
        /// Number of 32-bit constants.
        count: u32,
        /// The stages that read the constants.
        stages: ShaderStages,
    },
    /// A whole resource set, descriptor-table-eligible.
    ResourceSet(ResourceSetLayout),
    /// A single constant buffer bound directly (root CBV on the explicit
    /// backend).
    ConstantBuffer {
        /// The shader slot the buffer occupies.
        shader_slot: u32,
        /// The stages that read the buffer.
        stages: ShaderStages,
    },
}

/// Declares the binding interface of a pipeline, one entry per bind slot.
///
/// Entries are recorded in declaration order; [`ResourceLayoutDesc::validate`]
/// enforces the structural rules before a backend builds the layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceLayoutDesc {
    entries: Vec<(u32, LayoutEntry)>,
}

impl ResourceLayoutDesc {
    /// Creates an empty layout description.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `count` 32-bit inline constants at `bind_slot`.
    pub fn set_inline_constants(&mut self, bind_slot: u32, count: u32, stages: ShaderStages) {
        self.entries
            .push((bind_slot, LayoutEntry::InlineConstants { count, stages }));
    }

    /// Declares a resource set at `bind_slot`, snapshotting the set's shape.
    pub fn set_resource_set(&mut self, bind_slot: u32, set: &ResourceSet) {
        self.entries.push((
            bind_slot,
            LayoutEntry::ResourceSet(ResourceSetLayout::from_set(set)),
        ));
    }

    /// Declares a single constant buffer at `bind_slot`.
    pub fn set_constant_buffer(&mut self, bind_slot: u32, shader_slot: u32, stages: ShaderStages) {
        self.entries.push((
            bind_slot,
            LayoutEntry::ConstantBuffer {
                shader_slot,
                stages,
            },
        ));
    }

    /// The declared entries in declaration order.
    pub fn entries(&self) -> &[(u32, LayoutEntry)] {
        &self.entries
    }

    /// Checks the structural rules a backend relies on.
    ///
    /// Rules, in checking order: the layout must not be empty; no bind slot
    /// may be declared twice; bind slots must cover `0..n` without gaps;
    /// every binding inside a resource-set entry must carry the same stage
    /// mask (a descriptor table has a single visibility); a shader slot may
    /// not be claimed by two entries of the same category.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.entries.is_empty() {
            return Err(LayoutError::Empty);
        }

        let mut seen_slots = Vec::with_capacity(self.entries.len());
        for (bind_slot, _) in &self.entries {
            if seen_slots.contains(bind_slot) {
                return Err(LayoutError::SlotCollision {
                    bind_slot: *bind_slot,
                });
            }
            seen_slots.push(*bind_slot);
        }

        seen_slots.sort_unstable();
        for (expected, actual) in seen_slots.iter().enumerate() {
            if *actual != expected as u32 {
                return Err(LayoutError::SlotGap {
                    missing_slot: expected as u32,
                });
            }
        }

        for (bind_slot, entry) in &self.entries {
            if let LayoutEntry::ResourceSet(set) = entry {
                let mut bindings = set.bindings();
                if let Some(first) = bindings.next() {
                    for binding in bindings {
                        if binding.stages != first.stages {
                            return Err(LayoutError::MixedStageMasks {
                                bind_slot: *bind_slot,
                                expected: first.stages,
                                found: binding.stages,
                            });
                        }
                    }
                }
            }
        }

        self.check_shader_slot_conflicts()?;
        Ok(())
    }

    // A shader slot claimed twice within one binding category aliases in
    // the per-stage binding arrays of the immediate backend and collapses
    // descriptor ranges on the explicit backend. Constant buffers are one
    // category; textures and raw buffers share the SRV category.
    fn check_shader_slot_conflicts(&self) -> Result<(), LayoutError> {
        fn claim(claimed: &mut Vec<u32>, shader_slot: u32) -> Result<(), LayoutError> {
            if claimed.contains(&shader_slot) {
                return Err(LayoutError::ShaderSlotConflict { shader_slot });
            }
            claimed.push(shader_slot);
            Ok(())
        }

        let mut cb_slots: Vec<u32> = Vec::new();
        let mut srv_slots: Vec<u32> = Vec::new();
        for (_, entry) in &self.entries {
            match entry {
                LayoutEntry::ConstantBuffer { shader_slot, .. } => {
                    claim(&mut cb_slots, *shader_slot)?;
                }
                LayoutEntry::ResourceSet(set) => {
                    for binding in &set.constant_buffers {
                        claim(&mut cb_slots, binding.shader_slot)?;
                    }
                    for binding in set.textures.iter().chain(set.buffers.iter()) {
                        claim(&mut srv_slots, binding.shader_slot)?;
                    }
                }
                LayoutEntry::InlineConstants { .. } => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::invalidation::{InvalidationRegistry, ResourceSetToken};
    use crate::renderer::api::resource::{BufferId, TextureId, TextureViewKey};
    use crate::renderer::api::resource_set::BindingPolicy;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn test_set() -> ResourceSet {
        ResourceSet::new(
            BindingPolicy::ShaderRequested,
            ResourceSetToken(0),
            Arc::new(AtomicUsize::new(0)),
            Arc::new(InvalidationRegistry::new()),
        )
    }

    #[test]
    fn test_empty_layout_rejected() {
        let desc = ResourceLayoutDesc::new();
        assert_eq!(desc.validate(), Err(LayoutError::Empty));
    }

    #[test]
    fn test_contiguous_slots_pass() {
        let set = test_set();
        let mut desc = ResourceLayoutDesc::new();
        desc.set_inline_constants(0, 4, ShaderStages::VERTEX);
        desc.set_resource_set(1, &set);
        desc.set_constant_buffer(2, 7, ShaderStages::PIXEL);
        assert!(desc.validate().is_ok());
    }

    #[test]
    fn test_slot_gap_rejected() {
        let mut desc = ResourceLayoutDesc::new();
        desc.set_inline_constants(0, 4, ShaderStages::VERTEX);
        desc.set_constant_buffer(1, 7, ShaderStages::PIXEL);
        desc.set_constant_buffer(3, 8, ShaderStages::PIXEL);
        assert_eq!(desc.validate(), Err(LayoutError::SlotGap { missing_slot: 2 }));
    }

    #[test]
    fn test_slot_collision_rejected() {
        let mut desc = ResourceLayoutDesc::new();
        desc.set_inline_constants(0, 4, ShaderStages::VERTEX);
        desc.set_constant_buffer(0, 7, ShaderStages::PIXEL);
        assert_eq!(
            desc.validate(),
            Err(LayoutError::SlotCollision { bind_slot: 0 })
        );
    }

    #[test]
    fn test_mixed_stage_masks_rejected() {
        let mut set = test_set();
        set.set_texture(
            0,
            Some(TextureId(1)),
            TextureViewKey::Default,
            ShaderStages::PIXEL,
        );
        set.set_constant_buffer(1, Some(BufferId(1)), ShaderStages::VERTEX);

        let mut desc = ResourceLayoutDesc::new();
        desc.set_resource_set(0, &set);
        assert_eq!(
            desc.validate(),
            Err(LayoutError::MixedStageMasks {
                bind_slot: 0,
                expected: ShaderStages::PIXEL,
                found: ShaderStages::VERTEX,
            })
        );
    }

    #[test]
    fn test_aliased_srv_slot_rejected() {
        // Textures and raw buffers share the SRV slot space; binding both
        // at shader slot 0 would silently overwrite on a flat-slot backend.
        let mut set = test_set();
        set.set_texture(
            0,
            Some(TextureId(1)),
            TextureViewKey::Default,
            ShaderStages::PIXEL,
        );
        set.set_buffer(0, Some(BufferId(2)), ShaderStages::PIXEL);

        let mut desc = ResourceLayoutDesc::new();
        desc.set_resource_set(0, &set);
        assert_eq!(
            desc.validate(),
            Err(LayoutError::ShaderSlotConflict { shader_slot: 0 })
        );
    }

    #[test]
    fn test_shader_slot_conflict_rejected() {
        let mut set = test_set();
        set.set_constant_buffer(5, Some(BufferId(1)), ShaderStages::PIXEL);

        let mut desc = ResourceLayoutDesc::new();
        desc.set_resource_set(0, &set);
        desc.set_constant_buffer(1, 5, ShaderStages::PIXEL);
        assert_eq!(
            desc.validate(),
            Err(LayoutError::ShaderSlotConflict { shader_slot: 5 })
        );
    }
}
