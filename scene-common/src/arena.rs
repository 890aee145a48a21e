//! Arena storage for import outputs
//!
//! One [`Arena`] exists per import run. Every output buffer (merged geometry,
//! tangent spaces, texture pixels, scene records) is a block in the arena,
//! addressed through a typed [`Handle`]. Views and slices borrow the arena, so
//! the borrow checker guarantees they never outlive it.
//!
//! Blocks can be released early with [`Arena::free`]; released blocks are
//! recorded so teardown ([`Arena::clear`] / drop) skips them.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use bytemuck::Pod;
use hashbrown::HashSet;

use crate::view::{StridedView, StridedViewMut, ViewError};

static NEXT_ARENA_ID: AtomicU64 = AtomicU64::new(1);

type Block = Box<dyn Any + Send + Sync>;

/// Errors raised when resolving handles
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArenaError {
    #[error("handle belongs to arena {handle_arena}, not arena {arena}")]
    ForeignHandle { arena: u64, handle_arena: u64 },

    #[error("block {0} does not exist")]
    UnknownBlock(u32),

    #[error("block {0} was already released")]
    Released(u32),

    #[error("block {block} does not hold elements of type {expected}")]
    TypeMismatch { block: u32, expected: &'static str },

    #[error("block {0} cannot be borrowed mutably twice")]
    Aliased(u32),

    #[error(transparent)]
    View(#[from] ViewError),
}

/// Typed reference to an arena block of `len` elements
pub struct Handle<T> {
    arena: u64,
    block: u32,
    len: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Block index inside the owning arena
    pub fn block(&self) -> u32 {
        self.block
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.arena == other.arena && self.block == other.block
    }
}

impl<T> Eq for Handle<T> {}

impl<T> std::hash::Hash for Handle<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.arena.hash(state);
        self.block.hash(state);
    }
}

impl<T> std::fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("arena", &self.arena)
            .field("block", &self.block)
            .field("len", &self.len)
            .finish()
    }
}

/// Bulk allocator owning every block it hands out
pub struct Arena {
    id: u64,
    blocks: Vec<Option<Block>>,
    released: HashSet<u32>,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("id", &self.id)
            .field("blocks", &self.blocks.len())
            .field("released", &self.released.len())
            .finish()
    }
}

fn downcast<T: 'static>(slot: &Option<Block>, block: u32) -> Result<&[T], ArenaError> {
    slot.as_ref()
        .ok_or(ArenaError::Released(block))?
        .downcast_ref::<Vec<T>>()
        .map(Vec::as_slice)
        .ok_or(ArenaError::TypeMismatch {
            block,
            expected: std::any::type_name::<T>(),
        })
}

fn downcast_mut<T: 'static>(slot: &mut Option<Block>, block: u32) -> Result<&mut [T], ArenaError> {
    slot.as_mut()
        .ok_or(ArenaError::Released(block))?
        .downcast_mut::<Vec<T>>()
        .map(Vec::as_mut_slice)
        .ok_or(ArenaError::TypeMismatch {
            block,
            expected: std::any::type_name::<T>(),
        })
}

impl Arena {
    pub fn new() -> Self {
        Self {
            id: NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed),
            blocks: Vec::new(),
            released: HashSet::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Allocate `count` default-initialized elements
    ///
    /// Returns `None` when the allocation cannot be satisfied.
    pub fn allocate<T>(&mut self, count: usize) -> Option<Handle<T>>
    where
        T: Default + Clone + Send + Sync + 'static,
    {
        let mut data: Vec<T> = Vec::new();
        data.try_reserve_exact(count).ok()?;
        data.resize(count, T::default());
        self.push_block(data)
    }

    /// Take ownership of an already filled buffer
    pub fn adopt<T: Send + Sync + 'static>(&mut self, data: Vec<T>) -> Option<Handle<T>> {
        self.push_block(data)
    }

    fn push_block<T: Send + Sync + 'static>(&mut self, data: Vec<T>) -> Option<Handle<T>> {
        let block = u32::try_from(self.blocks.len()).ok()?;
        let len = data.len();
        self.blocks.push(Some(Box::new(data)));
        Some(Handle {
            arena: self.id,
            block,
            len,
            _marker: PhantomData,
        })
    }

    fn check<T>(&self, handle: &Handle<T>) -> Result<usize, ArenaError> {
        if handle.arena != self.id {
            return Err(ArenaError::ForeignHandle {
                arena: self.id,
                handle_arena: handle.arena,
            });
        }
        let index = handle.block as usize;
        if index >= self.blocks.len() {
            return Err(ArenaError::UnknownBlock(handle.block));
        }
        Ok(index)
    }

    /// Release a block before teardown
    ///
    /// Returns `false` if the block had already been released.
    pub fn free<T>(&mut self, handle: Handle<T>) -> Result<bool, ArenaError> {
        let index = self.check(&handle)?;
        if !self.released.insert(handle.block) {
            return Ok(false);
        }
        self.blocks[index] = None;
        Ok(true)
    }

    pub fn is_released<T>(&self, handle: &Handle<T>) -> bool {
        handle.arena == self.id && self.released.contains(&handle.block)
    }

    /// Number of blocks still owned by the arena
    pub fn live_blocks(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_some()).count()
    }

    /// Release every block not released explicitly
    ///
    /// Slots are kept so block numbers are never reused; handles issued
    /// before the clear resolve to [`ArenaError::Released`].
    pub fn clear(&mut self) {
        for (index, slot) in (0u32..).zip(self.blocks.iter_mut()) {
            if self.released.insert(index) {
                *slot = None;
            }
        }
    }

    pub fn slice<T: 'static>(&self, handle: Handle<T>) -> Result<&[T], ArenaError> {
        let index = self.check(&handle)?;
        downcast(&self.blocks[index], handle.block)
    }

    pub fn slice_mut<T: 'static>(&mut self, handle: Handle<T>) -> Result<&mut [T], ArenaError> {
        let index = self.check(&handle)?;
        downcast_mut(&mut self.blocks[index], handle.block)
    }

    pub fn view<T: Pod>(&self, handle: Handle<T>) -> Result<StridedView<'_, T>, ArenaError> {
        Ok(StridedView::from_slice(self.slice(handle)?))
    }

    pub fn view_mut<T: Pod>(&mut self, handle: Handle<T>) -> Result<StridedViewMut<'_, T>, ArenaError> {
        Ok(StridedViewMut::from_slice(self.slice_mut(handle)?))
    }

    /// Mutably borrow two distinct blocks at once
    pub fn pair_mut<T: 'static, U: 'static>(
        &mut self,
        first: Handle<T>,
        second: Handle<U>,
    ) -> Result<(&mut [T], &mut [U]), ArenaError> {
        let a = self.check(&first)?;
        let b = self.check(&second)?;
        if a == b {
            return Err(ArenaError::Aliased(first.block));
        }
        let (slot_a, slot_b) = if a < b {
            let (lo, hi) = self.blocks.split_at_mut(b);
            (&mut lo[a], &mut hi[0])
        } else {
            let (lo, hi) = self.blocks.split_at_mut(a);
            (&mut hi[0], &mut lo[b])
        };
        Ok((
            downcast_mut(slot_a, first.block)?,
            downcast_mut(slot_b, second.block)?,
        ))
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        self.clear();
    }
}
