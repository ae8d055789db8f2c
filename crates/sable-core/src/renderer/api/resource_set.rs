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

//! Resource sets: slot-to-resource binding tables with dirty tracking.
//!
//! A resource set maps shader binding slots to textures, samplers, constant
//! buffers and raw buffers, together with the shader stages that consume
//! each binding. Mutation marks the set dirty and bumps the context-wide
//! dirty counter; a backend build resolves the high-level bindings into the
//! backend's consumable form and clears the flag.

use super::common::ShaderStages;
use super::invalidation::{InvalidationRegistry, ResourceSetToken};
use super::resource::{
    BufferId, SamplerId, SamplerStateDesc, TextureId, TextureSemantic, TextureViewKey,
    PER_MATERIAL_CB_SLOT,
};
use crate::renderer::traits::backend::CompiledResourceBindings;
use crate::renderer::traits::material::{DefaultResources, MaterialResources};
use log::trace;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// How a command list resolves this set's bindings against a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingPolicy {
    /// Bind only the slots the active shader's reflection requests.
    #[default]
    ShaderRequested,
    /// Bind every slot the set has a value for, for passes whose shader
    /// variation is not known at binding time.
    Exhaustive,
}

/// A texture binding: handle, view selector and consuming stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureBinding {
    /// The bound texture, or `None` for an explicit null binding.
    pub texture: Option<TextureId>,
    /// Which view of the texture resolves at build time.
    pub view: TextureViewKey,
    /// The stages that consume the binding.
    pub stages: ShaderStages,
}

/// A sampler binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerBinding {
    /// The bound sampler-state object.
    pub sampler: SamplerId,
    /// The sampler's state, kept alongside the handle so the explicit
    /// backend can bake it into a static-sampler description.
    pub state: SamplerStateDesc,
    /// The stages that consume the binding.
    pub stages: ShaderStages,
}

/// A constant-buffer or raw-buffer binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferBinding {
    /// The bound buffer, or `None` for an explicit null binding.
    pub buffer: Option<BufferId>,
    /// The stages that consume the binding.
    pub stages: ShaderStages,
}

/// A slot-to-resource binding table with dirty tracking.
///
/// Created by the device context; the context hands the set its share of
/// the global dirty counter and the texture-invalidation registry.
#[derive(Debug)]
pub struct ResourceSet {
    policy: BindingPolicy,
    token: ResourceSetToken,

    textures: BTreeMap<u32, TextureBinding>,
    samplers: BTreeMap<u32, SamplerBinding>,
    constant_buffers: BTreeMap<u32, BufferBinding>,
    buffers: BTreeMap<u32, BufferBinding>,

    dirty: Arc<AtomicBool>,
    global_dirty: Arc<AtomicUsize>,
    registry: Arc<InvalidationRegistry>,

    compiled: Option<Box<dyn CompiledResourceBindings>>,
    build_revision: u64,
}

impl ResourceSet {
    /// Creates an empty set. Called by the device context, which owns the
    /// token allocation and the shared counter/registry.
    pub fn new(
        policy: BindingPolicy,
        token: ResourceSetToken,
        global_dirty: Arc<AtomicUsize>,
        registry: Arc<InvalidationRegistry>,
    ) -> Self {
        Self {
            policy,
            token,
            textures: BTreeMap::new(),
            samplers: BTreeMap::new(),
            constant_buffers: BTreeMap::new(),
            buffers: BTreeMap::new(),
            dirty: Arc::new(AtomicBool::new(false)),
            global_dirty,
            registry,
            compiled: None,
            build_revision: 0,
        }
    }

    /// The binding policy chosen at creation.
    pub fn policy(&self) -> BindingPolicy {
        self.policy
    }

    /// The registry token identifying this set.
    pub fn token(&self) -> ResourceSetToken {
        self.token
    }

    /// Whether the set has been mutated since its last build.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
        self.global_dirty.fetch_add(1, Ordering::AcqRel);
    }

    /// Binds `texture` at `slot` for `stages`, replacing any existing
    /// texture binding there.
    ///
    /// Rebinding a value-identical binding is a no-op. Otherwise the old
    /// texture's invalidation back-reference is dropped, the new texture is
    /// registered so external changes re-dirty the set, and the set is
    /// marked dirty.
    pub fn set_texture(
        &mut self,
        slot: u32,
        texture: Option<TextureId>,
        view: TextureViewKey,
        stages: ShaderStages,
    ) {
        let binding = TextureBinding {
            texture,
            view,
            stages,
        };
        if self.textures.get(&slot) == Some(&binding) {
            return;
        }

        if let Some(old) = self.textures.insert(slot, binding) {
            if let Some(old_texture) = old.texture {
                self.registry.deregister(old_texture, self.token);
            }
        }
        if let Some(new_texture) = texture {
            self.registry
                .register(new_texture, self.token, Arc::downgrade(&self.dirty));
        }
        self.mark_dirty();
    }

    /// Binds a sampler at `slot` for `stages`. Value-identical rebinds are
    /// no-ops.
    pub fn set_sampler(
        &mut self,
        slot: u32,
        sampler: SamplerId,
        state: SamplerStateDesc,
        stages: ShaderStages,
    ) {
        let binding = SamplerBinding {
            sampler,
            state,
            stages,
        };
        if self.samplers.get(&slot) == Some(&binding) {
            return;
        }
        self.samplers.insert(slot, binding);
        self.mark_dirty();
    }

    /// Binds a constant buffer at `slot` for `stages`. Value-identical
    /// rebinds are no-ops.
    pub fn set_constant_buffer(&mut self, slot: u32, buffer: Option<BufferId>, stages: ShaderStages) {
        let binding = BufferBinding { buffer, stages };
        if self.constant_buffers.get(&slot) == Some(&binding) {
            return;
        }
        self.constant_buffers.insert(slot, binding);
        self.mark_dirty();
    }

    /// Binds a raw buffer at `slot` for `stages`. Value-identical rebinds
    /// are no-ops.
    pub fn set_buffer(&mut self, slot: u32, buffer: Option<BufferId>, stages: ShaderStages) {
        let binding = BufferBinding { buffer, stages };
        if self.buffers.get(&slot) == Some(&binding) {
            return;
        }
        self.buffers.insert(slot, binding);
        self.mark_dirty();
    }

    /// Discards every binding, dropping texture back-references.
    pub fn clear(&mut self) {
        for binding in self.textures.values() {
            if let Some(texture) = binding.texture {
                self.registry.deregister(texture, self.token);
            }
        }
        self.textures.clear();
        self.samplers.clear();
        self.constant_buffers.clear();
        self.buffers.clear();
        self.mark_dirty();
    }

    /// Repopulates the set from a material's texture table.
    ///
    /// Every semantic slot receives a texture: the material's where it
    /// provides one, the engine default otherwise. The material constant
    /// buffer lands on the per-material slot. All previous bindings are
    /// discarded. This operation has no failure mode.
    pub fn fill(
        &mut self,
        material: &dyn MaterialResources,
        defaults: &dyn DefaultResources,
        stages: ShaderStages,
    ) {
        self.clear();
        for semantic in TextureSemantic::ALL {
            let texture = material
                .texture(semantic)
                .unwrap_or_else(|| defaults.default_texture(semantic));
            self.set_texture(
                semantic.shader_slot(),
                Some(texture),
                TextureViewKey::Default,
                stages,
            );
        }
        self.set_constant_buffer(PER_MATERIAL_CB_SLOT, Some(material.constant_buffer()), stages);
        trace!(
            "resource set {:?} filled from material, {} textures",
            self.token,
            TextureSemantic::ALL.len()
        );
    }

    /// The union of stage masks across every binding.
    pub fn shader_stages(&self) -> ShaderStages {
        let mut stages = ShaderStages::EMPTY;
        for binding in self.textures.values() {
            stages |= binding.stages;
        }
        for binding in self.samplers.values() {
            stages |= binding.stages;
        }
        for binding in self.constant_buffers.values() {
            stages |= binding.stages;
        }
        for binding in self.buffers.values() {
            stages |= binding.stages;
        }
        stages
    }

    /// The texture bindings in slot order.
    pub fn textures(&self) -> &BTreeMap<u32, TextureBinding> {
        &self.textures
    }

    /// The sampler bindings in slot order.
    pub fn samplers(&self) -> &BTreeMap<u32, SamplerBinding> {
        &self.samplers
    }

    /// The constant-buffer bindings in slot order.
    pub fn constant_buffers(&self) -> &BTreeMap<u32, BufferBinding> {
        &self.constant_buffers
    }

    /// The raw-buffer bindings in slot order.
    pub fn buffers(&self) -> &BTreeMap<u32, BufferBinding> {
        &self.buffers
    }

    /// The total number of view-carrying resources (textures, constant
    /// buffers, raw buffers). Sizes the explicit backend's descriptor block.
    pub fn resource_count(&self) -> usize {
        self.textures.len() + self.constant_buffers.len() + self.buffers.len()
    }

    /// Installs a backend build of this set and clears the dirty flag.
    ///
    /// Safe to call repeatedly; each build replaces the previous one and
    /// advances the build revision the command lists use for redundancy
    /// filtering.
    pub fn install_compiled(&mut self, compiled: Box<dyn CompiledResourceBindings>) {
        self.compiled = Some(compiled);
        self.build_revision += 1;
        self.dirty.store(false, Ordering::Release);
    }

    /// The current backend build, if any.
    pub fn compiled(&self) -> Option<&dyn CompiledResourceBindings> {
        self.compiled.as_deref()
    }

    /// The build revision, advanced on every [`ResourceSet::install_compiled`].
    pub fn build_revision(&self) -> u64 {
        self.build_revision
    }
}

impl Drop for ResourceSet {
    fn drop(&mut self) {
        // Weak flags in the registry expire on their own, but dropping the
        // back-references eagerly keeps the registry small.
        for binding in self.textures.values() {
            if let Some(texture) = binding.texture {
                self.registry.deregister(texture, self.token);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_set(policy: BindingPolicy) -> ResourceSet {
        ResourceSet::new(
            policy,
            ResourceSetToken(1),
            Arc::new(AtomicUsize::new(0)),
            Arc::new(InvalidationRegistry::new()),
        )
    }

    #[test]
    fn test_set_texture_marks_dirty_once() {
        let mut set = test_set(BindingPolicy::ShaderRequested);
        assert!(!set.is_dirty());

        set.set_texture(
            0,
            Some(TextureId(5)),
            TextureViewKey::Default,
            ShaderStages::PIXEL,
        );
        assert!(set.is_dirty());

        let before = set.global_dirty.load(Ordering::Acquire);
        set.set_texture(
            0,
            Some(TextureId(5)),
            TextureViewKey::Default,
            ShaderStages::PIXEL,
        );
        assert_eq!(set.global_dirty.load(Ordering::Acquire), before);
    }

    #[test]
    fn test_idempotent_setters() {
        let mut set = test_set(BindingPolicy::ShaderRequested);
        set.set_sampler(
            0,
            SamplerId(1),
            SamplerStateDesc::default(),
            ShaderStages::PIXEL,
        );
        set.set_constant_buffer(1, Some(BufferId(2)), ShaderStages::VERTEX);
        set.set_buffer(2, None, ShaderStages::COMPUTE);
        let before = set.global_dirty.load(Ordering::Acquire);

        set.set_sampler(
            0,
            SamplerId(1),
            SamplerStateDesc::default(),
            ShaderStages::PIXEL,
        );
        set.set_constant_buffer(1, Some(BufferId(2)), ShaderStages::VERTEX);
        set.set_buffer(2, None, ShaderStages::COMPUTE);
        assert_eq!(set.global_dirty.load(Ordering::Acquire), before);
    }

    #[test]
    fn test_shader_stages_union() {
        let mut set = test_set(BindingPolicy::ShaderRequested);
        set.set_texture(
            0,
            Some(TextureId(1)),
            TextureViewKey::Default,
            ShaderStages::PIXEL,
        );
        set.set_constant_buffer(1, Some(BufferId(1)), ShaderStages::VERTEX | ShaderStages::PIXEL);
        assert_eq!(
            set.shader_stages(),
            ShaderStages::VERTEX | ShaderStages::PIXEL
        );
    }

    #[test]
    fn test_texture_rebind_moves_registration() {
        let registry = Arc::new(InvalidationRegistry::new());
        let mut set = ResourceSet::new(
            BindingPolicy::ShaderRequested,
            ResourceSetToken(9),
            Arc::new(AtomicUsize::new(0)),
            registry.clone(),
        );

        set.set_texture(
            0,
            Some(TextureId(1)),
            TextureViewKey::Default,
            ShaderStages::PIXEL,
        );
        assert_eq!(registry.dependent_count(TextureId(1)), 1);

        set.set_texture(
            0,
            Some(TextureId(2)),
            TextureViewKey::Default,
            ShaderStages::PIXEL,
        );
        assert_eq!(registry.dependent_count(TextureId(1)), 0);
        assert_eq!(registry.dependent_count(TextureId(2)), 1);
    }

    #[test]
    fn test_external_invalidation_re_dirties() {
        let registry = Arc::new(InvalidationRegistry::new());
        let mut set = ResourceSet::new(
            BindingPolicy::ShaderRequested,
            ResourceSetToken(4),
            Arc::new(AtomicUsize::new(0)),
            registry.clone(),
        );
        set.set_texture(
            0,
            Some(TextureId(1)),
            TextureViewKey::Default,
            ShaderStages::PIXEL,
        );
        set.dirty.store(false, Ordering::Release);

        registry.invalidate(TextureId(1));
        assert!(set.is_dirty());
    }
}
