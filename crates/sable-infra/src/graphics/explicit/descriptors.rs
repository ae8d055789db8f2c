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

//! A simulated shader-visible descriptor heap.
//!
//! Blocks are allocated monotonically and never freed; a resource-set build
//! writes its view descriptors through the block's cursor and rewinds the
//! cursor to the block start so the block handle always points at the first
//! descriptor when it is bound.

use sable_core::renderer::api::resource::{BufferId, TextureId, TextureViewKey};
use std::sync::Mutex;

/// One descriptor on the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewDescriptor {
    /// An unwritten or explicitly null descriptor.
    #[default]
    Null,
    /// A texture shader-resource view.
    TextureView(TextureId, TextureViewKey),
    /// A raw-buffer shader-resource view.
    BufferView(BufferId),
    /// A constant-buffer view.
    ConstantBufferView(BufferId),
}

/// A contiguous run of descriptors allocated from a [`DescriptorHeap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorBlock {
    start: usize,
    len: usize,
    cursor: usize,
}

impl DescriptorBlock {
    /// The heap offset of the block's first descriptor.
    pub fn start(&self) -> usize {
        self.start
    }

    /// The number of descriptors in the block.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the block holds no descriptors.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Rewinds the write cursor to the block start.
    pub fn rewind(&mut self) {
        self.cursor = self.start;
    }
}

/// A monotonically growing descriptor heap.
#[derive(Debug, Default)]
pub struct DescriptorHeap {
    descriptors: Mutex<Vec<ViewDescriptor>>,
}

impl DescriptorHeap {
    /// Creates an empty heap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a block of `len` null descriptors at the end of the heap.
    pub fn allocate_block(&self, len: usize) -> DescriptorBlock {
        let mut descriptors = self
            .descriptors
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let start = descriptors.len();
        descriptors.resize(start + len, ViewDescriptor::Null);
        DescriptorBlock {
            start,
            len,
            cursor: start,
        }
    }

    /// Writes `view` at the block's cursor and advances the cursor.
    ///
    /// Writing past the block's end is a recording bug caught in debug
    /// builds; release builds drop the descriptor.
    pub fn write(&self, block: &mut DescriptorBlock, view: ViewDescriptor) {
        debug_assert!(block.cursor < block.start + block.len);
        if block.cursor >= block.start + block.len {
            return;
        }
        let mut descriptors = self
            .descriptors
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        descriptors[block.cursor] = view;
        block.cursor += 1;
    }

    /// Reads the descriptor at heap offset `index`.
    pub fn descriptor(&self, index: usize) -> ViewDescriptor {
        self.descriptors
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(index)
            .copied()
            .unwrap_or(ViewDescriptor::Null)
    }

    /// The total number of descriptors ever allocated.
    pub fn allocated(&self) -> usize {
        self.descriptors
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
