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

//! Root signatures: the explicit backend's compiled resource layouts.
//!
//! A root signature orders the layout's entries into root parameters.
//! Resource-set entries become descriptor tables with contiguous CBV/SRV
//! ranges, their samplers become static samplers, inline constant buffers
//! become root CBVs, and inline constants become root constants.

use sable_core::renderer::api::layout::{
    LayoutEntry, ResourceLayoutDesc, ResourceSetLayout,
};
use sable_core::renderer::api::resource::SamplerStateDesc;
use sable_core::renderer::api::ShaderStages;
use sable_core::renderer::error::LayoutError;

/// The kind of view a descriptor range holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorRangeKind {
    /// Constant-buffer views.
    ConstantBufferView,
    /// Shader-resource views (textures and raw buffers).
    ShaderResourceView,
    /// Unordered-access views.
    UnorderedAccessView,
}

/// A run of contiguous shader slots of one view kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorRange {
    /// The view kind of every slot in the range.
    pub kind: DescriptorRangeKind,
    /// The first shader slot of the range.
    pub base_shader_slot: u32,
    /// The number of consecutive slots.
    pub count: u32,
}

/// A sampler baked into the root signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticSamplerDesc {
    /// The sampler shader slot.
    pub shader_slot: u32,
    /// The full sampler state.
    pub state: SamplerStateDesc,
    /// The stages that may sample with it.
    pub visibility: ShaderStages,
}

/// One root parameter, in bind-slot order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootParameter {
    /// Inline 32-bit constants pushed through the command list.
    Constants {
        /// The layout bind slot.
        bind_slot: u32,
        /// Number of 32-bit constants.
        count: u32,
        /// The stages that read the constants.
        visibility: ShaderStages,
    },
    /// A root constant-buffer view.
    ConstantBufferView {
        /// The layout bind slot.
        bind_slot: u32,
        /// The shader slot the buffer occupies.
        shader_slot: u32,
        /// The stages that read the buffer.
        visibility: ShaderStages,
    },
    /// A descriptor table covering one resource set.
    DescriptorTable {
        /// The layout bind slot.
        bind_slot: u32,
        /// Ordered ranges: CBVs first, then SRVs, matching the order
        /// descriptor blocks are written in.
        ranges: Vec<DescriptorRange>,
        /// The uniform stage visibility of the whole table.
        visibility: ShaderStages,
    },
}

/// A compiled resource layout for the explicit backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootSignature {
    parameters: Vec<RootParameter>,
    static_samplers: Vec<StaticSamplerDesc>,
}

fn contiguous_ranges(kind: DescriptorRangeKind, slots: &[u32]) -> Vec<DescriptorRange> {
    let mut sorted = slots.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut ranges: Vec<DescriptorRange> = Vec::new();
    for slot in sorted {
        match ranges.last_mut() {
            Some(range) if range.base_shader_slot + range.count == slot => {
                range.count += 1;
            }
            _ => ranges.push(DescriptorRange {
                kind,
                base_shader_slot: slot,
                count: 1,
            }),
        }
    }
    ranges
}

fn table_visibility(set: &ResourceSetLayout) -> ShaderStages {
    // Validation already enforced a uniform mask; any binding carries it.
    set.textures
        .first()
        .or_else(|| set.constant_buffers.first())
        .or_else(|| set.buffers.first())
        .or_else(|| set.samplers.first().map(|(binding, _)| binding))
        .map(|binding| binding.stages)
        .unwrap_or(ShaderStages::EMPTY)
}

impl RootSignature {
    /// Validates `desc` and compiles it into ordered root parameters.
    pub fn compile(desc: &ResourceLayoutDesc) -> Result<Self, LayoutError> {
        desc.validate()?;

        let mut entries: Vec<&(u32, LayoutEntry)> = desc.entries().iter().collect();
        entries.sort_by_key(|(bind_slot, _)| *bind_slot);

        let mut parameters = Vec::with_capacity(entries.len());
        let mut static_samplers = Vec::new();

        for (bind_slot, entry) in entries {
            match entry {
                LayoutEntry::InlineConstants { count, stages } => {
                    parameters.push(RootParameter::Constants {
                        bind_slot: *bind_slot,
                        count: *count,
                        visibility: *stages,
                    });
                }
                LayoutEntry::ConstantBuffer {
                    shader_slot,
                    stages,
                } => {
                    parameters.push(RootParameter::ConstantBufferView {
                        bind_slot: *bind_slot,
                        shader_slot: *shader_slot,
                        visibility: *stages,
                    });
                }
                LayoutEntry::ResourceSet(set) => {
                    let visibility = table_visibility(set);

                    let cb_slots: Vec<u32> = set
                        .constant_buffers
                        .iter()
                        .map(|binding| binding.shader_slot)
                        .collect();
                    let srv_slots: Vec<u32> = set
                        .textures
                        .iter()
                        .chain(set.buffers.iter())
                        .map(|binding| binding.shader_slot)
                        .collect();

                    let mut ranges =
                        contiguous_ranges(DescriptorRangeKind::ConstantBufferView, &cb_slots);
                    ranges.extend(contiguous_ranges(
                        DescriptorRangeKind::ShaderResourceView,
                        &srv_slots,
                    ));

                    for (binding, state) in &set.samplers {
                        static_samplers.push(StaticSamplerDesc {
                            shader_slot: binding.shader_slot,
                            state: *state,
                            visibility: binding.stages,
                        });
                    }

                    parameters.push(RootParameter::DescriptorTable {
                        bind_slot: *bind_slot,
                        ranges,
                        visibility,
                    });
                }
            }
        }

        Ok(Self {
            parameters,
            static_samplers,
        })
    }

    /// The root parameters in bind-slot order.
    pub fn parameters(&self) -> &[RootParameter] {
        &self.parameters
    }

    /// The static samplers baked from resource-set sampler states.
    pub fn static_samplers(&self) -> &[StaticSamplerDesc] {
        &self.static_samplers
    }

    /// The descriptor-table parameter for `bind_slot`, if one exists.
    pub fn table(&self, bind_slot: u32) -> Option<&RootParameter> {
        self.parameters.iter().find(|param| {
            matches!(param, RootParameter::DescriptorTable { bind_slot: slot, .. } if *slot == bind_slot)
        })
    }
}
