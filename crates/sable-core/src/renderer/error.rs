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

//! Defines the hierarchy of error types for the render-device layer.

use crate::renderer::api::resource::ShaderId;
use crate::renderer::api::ShaderStages;
use std::fmt;

/// An error raised by the shader-reflection collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    /// The requested shader permutation exists but has not been compiled yet.
    ///
    /// This is the one recoverable, expected failure of pipeline construction:
    /// the caller skips the draw for this frame and retries later.
    VariantUnavailable {
        /// The shader whose variant is missing.
        shader: ShaderId,
        /// The stages for which no compiled instance exists yet.
        stages: ShaderStages,
    },
    /// The requested technique index does not exist on the shader.
    UnknownTechnique {
        /// The shader that was queried.
        shader: ShaderId,
        /// The technique index that was requested.
        technique: usize,
    },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::VariantUnavailable { shader, stages } => {
                write!(
                    f,
                    "Shader variant for {shader:?} not yet compiled for stages {stages:?}"
                )
            }
            ShaderError::UnknownTechnique { shader, technique } => {
                write!(f, "Shader {shader:?} has no technique {technique}")
            }
        }
    }
}

impl std::error::Error for ShaderError {}

/// A structural error in a resource layout, detected by validation.
///
/// These are programmer errors discoverable at layout-construction time and
/// are therefore surfaced as hard errors rather than debug assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// The layout declares no resource sets, no constant buffers and no
    /// inline constants. A layout must bind something.
    Empty,
    /// Two declarations target the same bind slot.
    SlotCollision {
        /// The contested bind slot.
        bind_slot: u32,
    },
    /// The same shader slot receives differently-bound resources under
    /// different shader-stage masks.
    ShaderSlotConflict {
        /// The contested shader slot.
        shader_slot: u32,
    },
    /// A resource set mixes two different effective shader-stage masks,
    /// which a single descriptor table cannot express.
    MixedStageMasks {
        /// The bind slot of the offending resource set.
        bind_slot: u32,
        /// The first stage mask observed in the set.
        expected: ShaderStages,
        /// The conflicting stage mask.
        found: ShaderStages,
    },
    /// The used bind slots are not contiguous starting at 0.
    SlotGap {
        /// The first missing bind slot.
        missing_slot: u32,
    },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::Empty => {
                write!(f, "Resource layout binds nothing")
            }
            LayoutError::SlotCollision { bind_slot } => {
                write!(f, "Bind slot {bind_slot} is declared more than once")
            }
            LayoutError::ShaderSlotConflict { shader_slot } => {
                write!(
                    f,
                    "Shader slot {shader_slot} is bound twice with different stage visibility"
                )
            }
            LayoutError::MixedStageMasks {
                bind_slot,
                expected,
                found,
            } => {
                write!(
                    f,
                    "Resource set at bind slot {bind_slot} mixes stage masks {expected:?} and {found:?}"
                )
            }
            LayoutError::SlotGap { missing_slot } => {
                write!(f, "Bind slots are not contiguous, slot {missing_slot} is unused")
            }
        }
    }
}

impl std::error::Error for LayoutError {}

/// An error related to the creation of a graphics pipeline state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// A required shader variant was not available; the pipeline cannot be
    /// built this frame. Callers should skip the draw, not abort.
    ShaderVariantUnavailable(ShaderError),
    /// The backend failed to compile the pipeline state object.
    CompilationFailed {
        /// A descriptive label for the pipeline, if available.
        label: Option<String>,
        /// Detailed error messages from the backend.
        details: String,
    },
    /// The descriptor references a resource layout unknown to the device.
    UnknownLayout,
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::ShaderVariantUnavailable(err) => {
                write!(f, "Pipeline build aborted: {err}")
            }
            PipelineError::CompilationFailed { label, details } => {
                write!(
                    f,
                    "Pipeline compilation failed for '{}': {}",
                    label.as_deref().unwrap_or("Unknown"),
                    details
                )
            }
            PipelineError::UnknownLayout => {
                write!(f, "Pipeline descriptor references an unknown resource layout")
            }
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<ShaderError> for PipelineError {
    fn from(err: ShaderError) -> Self {
        PipelineError::ShaderVariantUnavailable(err)
    }
}

/// An error related to device-owned resources and pools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// A command list was forfeited to a pool that did not hand it out.
    NotPoolOwned {
        /// The submission ticket carried by the offending list.
        ticket: u64,
    },
    /// The same command list was forfeited twice.
    DoubleForfeit {
        /// The submission ticket carried by the offending list.
        ticket: u64,
    },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::NotPoolOwned { ticket } => {
                write!(f, "Command list with ticket {ticket} was not acquired from this pool")
            }
            ResourceError::DoubleForfeit { ticket } => {
                write!(f, "Command list with ticket {ticket} was already forfeited")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

/// The top-level error type aggregating every rendering error.
#[derive(Debug)]
pub enum RenderError {
    /// A shader-reflection failure.
    Shader(ShaderError),
    /// A resource-layout validation failure.
    Layout(LayoutError),
    /// A pipeline-state creation failure.
    Pipeline(PipelineError),
    /// A resource or pool failure.
    Resource(ResourceError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Shader(err) => write!(f, "{err}"),
            RenderError::Layout(err) => write!(f, "{err}"),
            RenderError::Pipeline(err) => write!(f, "{err}"),
            RenderError::Resource(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Shader(err) => Some(err),
            RenderError::Layout(err) => Some(err),
            RenderError::Pipeline(err) => Some(err),
            RenderError::Resource(err) => Some(err),
        }
    }
}

impl From<ShaderError> for RenderError {
    fn from(err: ShaderError) -> Self {
        RenderError::Shader(err)
    }
}

impl From<LayoutError> for RenderError {
    fn from(err: LayoutError) -> Self {
        RenderError::Layout(err)
    }
}

impl From<PipelineError> for RenderError {
    fn from(err: PipelineError) -> Self {
        RenderError::Pipeline(err)
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::Resource(err)
    }
}
