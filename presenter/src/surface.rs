//! Render surface seam and the in-memory implementation.
//!
//! A surface is any mutable display area that can append blocks, replace a
//! block it handed out earlier, and scroll to the newest block. Mutations are
//! synchronous; the presenter never reaches past this trait into layout.

use tracing::debug;

use crate::block::{Block, MessageBlock};

/// Opaque reference to a block previously appended to a surface.
///
/// Handles are only meaningful to the surface that issued them and become
/// stale once that surface is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockHandle(u64);

impl BlockHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// A display area the presenter can draw on.
pub trait RenderSurface {
    /// Remove every block.
    fn clear(&mut self);

    /// Append a block after the last one and return its handle.
    fn append_block(&mut self, block: Block) -> BlockHandle;

    /// Replace the content of a live block. Stale handles are ignored.
    fn update_block(&mut self, handle: BlockHandle, block: Block);

    /// Bring the newest block into view.
    fn scroll_to_latest(&mut self);
}

/// Mutation recorded by [`MemorySurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceOp {
    Clear,
    Append(BlockHandle),
    Update(BlockHandle),
    Scroll,
}

/// Surface that keeps its blocks in memory and logs every mutation.
#[derive(Debug, Default)]
pub struct MemorySurface {
    blocks: Vec<(BlockHandle, Block)>,
    next_id: u64,
    ops: Vec<SurfaceOp>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks currently displayed, top to bottom.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> + '_ {
        self.blocks.iter().map(|(_, block)| block)
    }

    /// Owned copy of the displayed blocks.
    pub fn snapshot(&self) -> Vec<Block> {
        self.blocks().cloned().collect()
    }

    pub fn block(&self, handle: BlockHandle) -> Option<&Block> {
        self.blocks
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, block)| block)
    }

    /// Chat bubbles currently displayed, in order.
    pub fn messages(&self) -> Vec<&MessageBlock> {
        self.blocks().filter_map(Block::as_message).collect()
    }

    /// Number of bubbles still showing their placeholder.
    pub fn pending_count(&self) -> usize {
        self.messages().iter().filter(|m| m.is_pending()).count()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Every mutation since creation, oldest first.
    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    pub fn scroll_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, SurfaceOp::Scroll))
            .count()
    }
}

impl RenderSurface for MemorySurface {
    fn clear(&mut self) {
        self.blocks.clear();
        self.ops.push(SurfaceOp::Clear);
    }

    fn append_block(&mut self, block: Block) -> BlockHandle {
        let handle = BlockHandle::new(self.next_id);
        self.next_id += 1;
        self.blocks.push((handle, block));
        self.ops.push(SurfaceOp::Append(handle));
        handle
    }

    fn update_block(&mut self, handle: BlockHandle, block: Block) {
        match self.blocks.iter_mut().find(|(h, _)| *h == handle) {
            Some((_, slot)) => {
                *slot = block;
                self.ops.push(SurfaceOp::Update(handle));
            }
            None => debug!(handle = handle.id(), "ignoring update for stale block"),
        }
    }

    fn scroll_to_latest(&mut self) {
        self.ops.push(SurfaceOp::Scroll);
    }
}
