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

//! The device context: the factory for resource sets, layouts, pipelines
//! and command lists.
//!
//! Each context is a self-contained object owning the PSO cache, the global
//! resource-set dirty counter, the texture invalidation registry and the
//! command-list pools. Tests and tools construct their own contexts; nothing
//! here is process-global.

use log::{debug, info, warn};
use sable_core::renderer::api::invalidation::{InvalidationRegistry, ResourceSetToken};
use sable_core::renderer::api::layout::ResourceLayoutDesc;
use sable_core::renderer::api::pso::GraphicsPsoDescriptor;
use sable_core::renderer::api::resource::{ResourceLayoutId, TextureId};
use sable_core::renderer::api::resource_set::{BindingPolicy, ResourceSet};
use sable_core::renderer::error::{LayoutError, PipelineError, ResourceError};
use sable_core::renderer::traits::backend::{
    CompiledPso, CompiledResourceLayout, GraphicsBackendKind, PipelineBackend,
};
use sable_core::renderer::traits::command_list::GraphicsCommandList;
use sable_core::renderer::traits::shader::{ShaderInstanceRequest, ShaderReflection};
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::create_backend;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// A command list checked out of a context pool, carrying its
/// allocation-order submission ticket.
#[derive(Debug)]
pub struct PooledCommandList {
    pool_id: u64,
    ticket: u64,
    list: Box<dyn GraphicsCommandList>,
}

impl PooledCommandList {
    /// The allocation-order submission ticket.
    pub fn ticket(&self) -> u64 {
        self.ticket
    }
}

impl Deref for PooledCommandList {
    type Target = dyn GraphicsCommandList;

    fn deref(&self) -> &Self::Target {
        self.list.as_ref()
    }
}

impl DerefMut for PooledCommandList {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.list.as_mut()
    }
}

/// A pool handing out command lists with allocation-order tickets.
///
/// Forfeited lists submit in ticket order: a list returned before its
/// predecessors is parked until they arrive.
#[derive(Debug)]
struct CommandListPool {
    id: u64,
    free: Vec<Box<dyn GraphicsCommandList>>,
    next_ticket: u64,
    next_submit: u64,
    parked: HashMap<u64, Box<dyn GraphicsCommandList>>,
}

impl CommandListPool {
    fn new() -> Self {
        Self {
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            free: Vec::new(),
            next_ticket: 0,
            next_submit: 0,
            parked: HashMap::new(),
        }
    }

    fn acquire(&mut self, count: usize, backend: &dyn PipelineBackend) -> Vec<PooledCommandList> {
        (0..count)
            .map(|_| {
                let mut list = self
                    .free
                    .pop()
                    .unwrap_or_else(|| backend.create_command_list());
                list.reset();
                let ticket = self.next_ticket;
                self.next_ticket += 1;
                PooledCommandList {
                    pool_id: self.id,
                    ticket,
                    list,
                }
            })
            .collect()
    }

    fn forfeit(&mut self, lists: Vec<PooledCommandList>) -> Result<(), ResourceError> {
        for pooled in lists {
            if pooled.pool_id != self.id || pooled.ticket >= self.next_ticket {
                return Err(ResourceError::NotPoolOwned {
                    ticket: pooled.ticket,
                });
            }
            if pooled.ticket < self.next_submit || self.parked.contains_key(&pooled.ticket) {
                return Err(ResourceError::DoubleForfeit {
                    ticket: pooled.ticket,
                });
            }
            self.parked.insert(pooled.ticket, pooled.list);
        }

        // Submit every run of consecutive tickets now complete.
        while let Some(list) = self.parked.remove(&self.next_submit) {
            self.free.push(list);
            self.next_submit += 1;
        }
        Ok(())
    }

    fn submitted(&self) -> u64 {
        self.next_submit
    }
}

/// The factory and cache owner for one graphics device.
#[derive(Debug)]
pub struct DeviceContext {
    backend: Box<dyn PipelineBackend>,
    reflection: Arc<dyn ShaderReflection>,
    pso_cache: Mutex<HashMap<GraphicsPsoDescriptor, Arc<dyn CompiledPso>>>,
    layouts: Mutex<HashMap<ResourceLayoutId, Arc<dyn CompiledResourceLayout>>>,
    next_layout_id: AtomicUsize,
    next_set_token: AtomicU64,
    global_dirty: Arc<AtomicUsize>,
    registry: Arc<InvalidationRegistry>,
    reverse_depth: AtomicBool,
    core_list: Mutex<Box<dyn GraphicsCommandList>>,
    graphics_pool: Mutex<CommandListPool>,
    compute_pool: Mutex<CommandListPool>,
    copy_pool: Mutex<CommandListPool>,
}

impl DeviceContext {
    /// Creates a context over the backend for `kind`.
    pub fn new(kind: GraphicsBackendKind, reflection: Arc<dyn ShaderReflection>) -> Self {
        let backend = create_backend(kind);
        let core_list = backend.create_command_list();
        Self {
            backend,
            reflection,
            pso_cache: Mutex::new(HashMap::new()),
            layouts: Mutex::new(HashMap::new()),
            next_layout_id: AtomicUsize::new(0),
            next_set_token: AtomicU64::new(0),
            global_dirty: Arc::new(AtomicUsize::new(0)),
            registry: Arc::new(InvalidationRegistry::new()),
            reverse_depth: AtomicBool::new(false),
            core_list: Mutex::new(core_list),
            graphics_pool: Mutex::new(CommandListPool::new()),
            compute_pool: Mutex::new(CommandListPool::new()),
            copy_pool: Mutex::new(CommandListPool::new()),
        }
    }

    /// The binding model of the owned backend.
    pub fn backend_kind(&self) -> GraphicsBackendKind {
        self.backend.kind()
    }

    /// The owned backend, for direct artifact inspection.
    pub fn backend(&self) -> &dyn PipelineBackend {
        self.backend.as_ref()
    }

    /// Creates an empty resource set wired into this context's dirty
    /// tracking and invalidation registry.
    pub fn create_resource_set(&self, policy: BindingPolicy) -> ResourceSet {
        let token = ResourceSetToken(self.next_set_token.fetch_add(1, Ordering::Relaxed));
        ResourceSet::new(
            policy,
            token,
            Arc::clone(&self.global_dirty),
            Arc::clone(&self.registry),
        )
    }

    /// Validates and builds `desc`, returning its identity for use in
    /// pipeline descriptors.
    pub fn create_resource_layout(
        &self,
        desc: &ResourceLayoutDesc,
    ) -> Result<ResourceLayoutId, LayoutError> {
        let compiled = self.backend.build_resource_layout(desc)?;
        let id = ResourceLayoutId(self.next_layout_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.layouts).insert(id, Arc::from(compiled));
        debug!("Built resource layout {id:?}");
        Ok(id)
    }

    /// Returns the compiled pipeline for `desc`, from cache or freshly
    /// compiled.
    ///
    /// Equal descriptors return the same `Arc`. A failed compile is never
    /// cached; the caller should skip the draw this frame and retry later.
    pub fn create_graphics_pso(
        &self,
        desc: &GraphicsPsoDescriptor,
    ) -> Result<Arc<dyn CompiledPso>, PipelineError> {
        if let Some(hit) = lock(&self.pso_cache).get(desc) {
            return Ok(Arc::clone(hit));
        }

        let layout = lock(&self.layouts)
            .get(&desc.resource_layout)
            .cloned()
            .ok_or(PipelineError::UnknownLayout)?;

        debug!(
            "PSO cache miss: shader {:?} technique {} flags {:#x}",
            desc.shader, desc.technique, desc.runtime_flags
        );

        let request = ShaderInstanceRequest {
            shader: desc.shader,
            technique: desc.technique as usize,
            runtime_flags: desc.runtime_flags,
            metadata_flags: desc.metadata_flags,
            metadata_vertex_flags: desc.metadata_vertex_flags,
            allow_tessellation: desc.allow_tessellation,
        };
        let shaders = self.reflection.shader_instance_info(&request).map_err(|err| {
            warn!("PSO build aborted, shader variant unavailable: {err}");
            PipelineError::from(err)
        })?;

        let pso = self
            .backend
            .compile_pso(
                desc,
                &shaders,
                layout.as_ref(),
                self.reverse_depth.load(Ordering::Acquire),
            )
            .map_err(|err| {
                warn!("PSO compilation failed: {err}");
                err
            })?;

        // Another thread may have compiled the same descriptor meanwhile;
        // the first insert wins so all callers share one instance.
        let mut cache = lock(&self.pso_cache);
        let entry = cache.entry(desc.clone()).or_insert(pso);
        Ok(Arc::clone(entry))
    }

    /// Drops every cached pipeline.
    ///
    /// Intended for shader hot-reload. Callers must not carry compiled-PSO
    /// handles across an invalidation.
    pub fn invalidate_pso_cache(&self) {
        let mut cache = lock(&self.pso_cache);
        info!("Invalidating PSO cache, dropping {} pipelines", cache.len());
        cache.clear();
    }

    /// The number of pipelines currently cached.
    pub fn pso_cache_len(&self) -> usize {
        lock(&self.pso_cache).len()
    }

    /// Resolves `set`'s bindings through the backend and installs the
    /// result, clearing the set's dirty flag.
    pub fn build_resource_set(&self, set: &mut ResourceSet) {
        let compiled = self.backend.build_resource_set(set);
        set.install_compiled(compiled);
    }

    /// Marks every resource set depending on `texture` dirty and bumps the
    /// global dirty counter once per affected set. Called when a texture's
    /// underlying views change (resize, stream-in).
    pub fn invalidate_texture(&self, texture: TextureId) -> usize {
        let count = self.registry.invalidate(texture);
        if count > 0 {
            self.global_dirty.fetch_add(count, Ordering::AcqRel);
            info!("Texture {texture:?} invalidated {count} resource sets");
        }
        count
    }

    /// The number of resource-set mutations since the last reset. Frame
    /// code uses this to decide whether any set needs rebuilding.
    pub fn global_dirty_count(&self) -> usize {
        self.global_dirty.load(Ordering::Acquire)
    }

    /// Resets the global dirty counter, typically once per frame.
    pub fn reset_global_dirty_count(&self) {
        self.global_dirty.store(0, Ordering::Release);
    }

    /// Switches every subsequent pipeline compile to the given depth
    /// convention. Cached pipelines keep the convention they were compiled
    /// with; callers invalidate the cache when flipping mid-run.
    pub fn set_reverse_depth(&self, enabled: bool) {
        self.reverse_depth.store(enabled, Ordering::Release);
    }

    /// Whether pipelines currently compile for a reversed depth range.
    pub fn reverse_depth(&self) -> bool {
        self.reverse_depth.load(Ordering::Acquire)
    }

    /// Runs `f` against the context's core command list.
    pub fn with_core_command_list<R>(
        &self,
        f: impl FnOnce(&mut dyn GraphicsCommandList) -> R,
    ) -> R {
        let mut list = lock(&self.core_list);
        f(list.as_mut())
    }

    /// Checks out `count` command lists for parallel graphics recording.
    pub fn acquire_graphics_command_lists(&self, count: usize) -> Vec<PooledCommandList> {
        lock(&self.graphics_pool).acquire(count, self.backend.as_ref())
    }

    /// Returns recorded graphics lists to the pool. Lists submit in
    /// ticket order; early arrivals are parked until their predecessors
    /// are forfeited.
    pub fn forfeit_graphics_command_lists(
        &self,
        lists: Vec<PooledCommandList>,
    ) -> Result<(), ResourceError> {
        lock(&self.graphics_pool).forfeit(lists)
    }

    /// The number of graphics lists submitted in order so far.
    pub fn graphics_submission_count(&self) -> u64 {
        lock(&self.graphics_pool).submitted()
    }

    /// Checks out `count` command lists for compute recording.
    pub fn acquire_compute_command_lists(&self, count: usize) -> Vec<PooledCommandList> {
        lock(&self.compute_pool).acquire(count, self.backend.as_ref())
    }

    /// Returns recorded compute lists to their pool.
    pub fn forfeit_compute_command_lists(
        &self,
        lists: Vec<PooledCommandList>,
    ) -> Result<(), ResourceError> {
        lock(&self.compute_pool).forfeit(lists)
    }

    /// Checks out `count` command lists for copy recording.
    pub fn acquire_copy_command_lists(&self, count: usize) -> Vec<PooledCommandList> {
        lock(&self.copy_pool).acquire(count, self.backend.as_ref())
    }

    /// Returns recorded copy lists to their pool.
    pub fn forfeit_copy_command_lists(
        &self,
        lists: Vec<PooledCommandList>,
    ) -> Result<(), ResourceError> {
        lock(&self.copy_pool).forfeit(lists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_core::renderer::api::resource::ShaderId;
    use sable_core::renderer::api::ShaderStages;
    use sable_core::renderer::error::ShaderError;
    use sable_core::renderer::traits::shader::{
        DeviceShaderHandle, ShaderInstanceInfo, StageBindings,
    };

    /// Reflection stub resolving every request to a vertex+pixel variant,
    /// except shaders flagged unavailable.
    #[derive(Debug, Default)]
    struct StubReflection {
        unavailable: Vec<ShaderId>,
    }

    impl ShaderReflection for StubReflection {
        fn shader_instance_info(
            &self,
            request: &ShaderInstanceRequest,
        ) -> Result<ShaderInstanceInfo, ShaderError> {
            if self.unavailable.contains(&request.shader) {
                return Err(ShaderError::VariantUnavailable {
                    shader: request.shader,
                    stages: ShaderStages::PIXEL,
                });
            }
            let mut info = ShaderInstanceInfo::default();
            info.stages[0] = StageBindings {
                device_shader: Some(DeviceShaderHandle(request.shader.0 as u64)),
                constant_buffer_slots: vec![0],
                ..Default::default()
            };
            info.stages[4] = StageBindings {
                device_shader: Some(DeviceShaderHandle(request.shader.0 as u64 + 100)),
                srv_slots: vec![0],
                sampler_slots: vec![0],
                constant_buffer_slots: vec![0],
                ..Default::default()
            };
            Ok(info)
        }
    }

    fn test_context(kind: GraphicsBackendKind) -> DeviceContext {
        DeviceContext::new(kind, Arc::new(StubReflection::default()))
    }

    fn simple_layout(context: &DeviceContext) -> ResourceLayoutId {
        let mut desc = ResourceLayoutDesc::new();
        desc.set_constant_buffer(0, 0, ShaderStages::VERTEX);
        context.create_resource_layout(&desc).unwrap()
    }

    #[test]
    fn test_pso_cache_hit_returns_same_arc() {
        for kind in [GraphicsBackendKind::Immediate, GraphicsBackendKind::Explicit] {
            let context = test_context(kind);
            let layout = simple_layout(&context);
            let desc = GraphicsPsoDescriptor::new(ShaderId(1), 0, 0, 0, 0, layout);

            let a = context.create_graphics_pso(&desc).unwrap();
            let b = context.create_graphics_pso(&desc.clone()).unwrap();
            assert!(Arc::ptr_eq(&a, &b));
            assert_eq!(context.pso_cache_len(), 1);
        }
    }

    #[test]
    fn test_failed_compile_is_not_cached() {
        let context = DeviceContext::new(
            GraphicsBackendKind::Immediate,
            Arc::new(StubReflection {
                unavailable: vec![ShaderId(9)],
            }),
        );
        let layout = simple_layout(&context);
        let desc = GraphicsPsoDescriptor::new(ShaderId(9), 0, 0, 0, 0, layout);

        assert!(matches!(
            context.create_graphics_pso(&desc),
            Err(PipelineError::ShaderVariantUnavailable(_))
        ));
        assert_eq!(context.pso_cache_len(), 0);
    }

    #[test]
    fn test_unknown_layout_rejected() {
        let context = test_context(GraphicsBackendKind::Immediate);
        let desc = GraphicsPsoDescriptor::new(ShaderId(1), 0, 0, 0, 0, ResourceLayoutId(42));
        assert!(matches!(
            context.create_graphics_pso(&desc),
            Err(PipelineError::UnknownLayout)
        ));
    }

    #[test]
    fn test_cache_invalidation_forces_recompile() {
        let context = test_context(GraphicsBackendKind::Immediate);
        let layout = simple_layout(&context);
        let desc = GraphicsPsoDescriptor::new(ShaderId(1), 0, 0, 0, 0, layout);

        let a = context.create_graphics_pso(&desc).unwrap();
        context.invalidate_pso_cache();
        assert_eq!(context.pso_cache_len(), 0);
        let b = context.create_graphics_pso(&desc).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_texture_invalidation_bumps_global_counter() {
        let context = test_context(GraphicsBackendKind::Immediate);
        let mut set = context.create_resource_set(BindingPolicy::ShaderRequested);
        set.set_texture(
            0,
            Some(TextureId(5)),
            sable_core::renderer::api::TextureViewKey::Default,
            ShaderStages::PIXEL,
        );
        context.build_resource_set(&mut set);
        context.reset_global_dirty_count();

        assert!(!set.is_dirty());
        assert_eq!(context.invalidate_texture(TextureId(5)), 1);
        assert!(set.is_dirty());
        assert_eq!(context.global_dirty_count(), 1);

        // Untracked textures invalidate nothing.
        assert_eq!(context.invalidate_texture(TextureId(99)), 0);
        assert_eq!(context.global_dirty_count(), 1);
    }

    #[test]
    fn test_out_of_order_forfeits_are_parked() {
        let context = test_context(GraphicsBackendKind::Immediate);
        let mut lists = context.acquire_graphics_command_lists(3);
        let last = lists.pop().unwrap();
        let middle = lists.pop().unwrap();
        let first = lists.pop().unwrap();

        context.forfeit_graphics_command_lists(vec![last]).unwrap();
        assert_eq!(context.graphics_submission_count(), 0);

        context.forfeit_graphics_command_lists(vec![first]).unwrap();
        assert_eq!(context.graphics_submission_count(), 1);

        context.forfeit_graphics_command_lists(vec![middle]).unwrap();
        assert_eq!(context.graphics_submission_count(), 3);
    }

    #[test]
    fn test_cross_pool_forfeit_rejected() {
        let context = test_context(GraphicsBackendKind::Immediate);
        let mut lists = context.acquire_compute_command_lists(1);
        let list = lists.pop().unwrap();
        let ticket = list.ticket();

        assert_eq!(
            context.forfeit_graphics_command_lists(vec![list]),
            Err(ResourceError::NotPoolOwned { ticket })
        );
    }

    #[test]
    fn test_copy_pool_reuses_forfeited_lists() {
        let context = test_context(GraphicsBackendKind::Immediate);
        let lists = context.acquire_copy_command_lists(2);
        let tickets: Vec<u64> = lists.iter().map(|l| l.ticket()).collect();
        assert_eq!(tickets, vec![0, 1]);

        context.forfeit_copy_command_lists(lists).unwrap();
        let lists = context.acquire_copy_command_lists(1);
        assert_eq!(lists[0].ticket(), 2);
    }
}
