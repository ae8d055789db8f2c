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

//! Weak back-references from textures to the resource sets that bind them.
//!
//! When a texture changes externally (a render-target resize, a streaming
//! update), every resource set binding it must rebuild its backend bindings.
//! The registry holds only `Weak` references to the sets' dirty flags, so a
//! resource set that is dropped without deregistering can never be touched
//! through a dangling back-reference; dead entries are pruned on the next
//! invalidation of the same texture.

use super::resource::TextureId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, Weak};

/// Identifies one resource set inside the registry.
///
/// Tokens are handed out by the device context at resource-set creation and
/// are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceSetToken(pub u64);

/// The texture-to-resource-set back-reference table.
#[derive(Debug, Default)]
pub struct InvalidationRegistry {
    dependents: Mutex<DependentMap>,
}

type DependentMap = HashMap<TextureId, HashMap<ResourceSetToken, Weak<AtomicBool>>>;

impl InvalidationRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn dependents(&self) -> MutexGuard<'_, DependentMap> {
        self.dependents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers `token`'s dirty flag as a dependent of `texture`.
    pub fn register(&self, texture: TextureId, token: ResourceSetToken, flag: Weak<AtomicBool>) {
        let mut dependents = self.dependents();
        dependents.entry(texture).or_default().insert(token, flag);
    }

    /// Removes `token` from `texture`'s dependents.
    ///
    /// Removing a pairing that was never registered is a no-op.
    pub fn deregister(&self, texture: TextureId, token: ResourceSetToken) {
        let mut dependents = self.dependents();
        if let Some(entries) = dependents.get_mut(&texture) {
            entries.remove(&token);
            if entries.is_empty() {
                dependents.remove(&texture);
            }
        }
    }

    /// Marks every live dependent of `texture` dirty.
    ///
    /// Returns the number of resource sets reached. Entries whose set has
    /// been dropped are pruned.
    pub fn invalidate(&self, texture: TextureId) -> usize {
        let mut dependents = self.dependents();
        let Some(entries) = dependents.get_mut(&texture) else {
            return 0;
        };

        let mut marked = 0;
        entries.retain(|_, flag| match flag.upgrade() {
            Some(dirty) => {
                dirty.store(true, Ordering::Release);
                marked += 1;
                true
            }
            None => false,
        });
        if entries.is_empty() {
            dependents.remove(&texture);
        }
        marked
    }

    /// Returns the number of live registrations for `texture`.
    pub fn dependent_count(&self, texture: TextureId) -> usize {
        let dependents = self.dependents();
        dependents.get(&texture).map_or(0, |entries| entries.len())
    }
}
