//! The live set of zone blocks.

use common::{KeyIndexKey, KeyIndexVec, id_type};
use raster::{PixelBuffer, Rect, Rgb};
use serde::{Deserialize, Serialize};

use crate::detection::Candidate;

id_type!(BlockId);

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Block {id} rectangle {rect} does not fit the {width}x{height} canvas")]
    OutOfBounds {
        id: BlockId,
        rect: Rect,
        width: u32,
        height: u32,
    },
    #[error("Block id {0} is already registered")]
    DuplicateId(BlockId),
    #[error("Block {0} is not registered")]
    UnknownBlock(BlockId),
    #[error("Block {0} is marked moved without an original rectangle")]
    MissingOriginal(BlockId),
}

/// A rectangular zone on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub rect: Rect,
    pub label: String,
    /// Palette reference color the block was detected with.
    pub color: Rgb,
    /// Opaque pixels captured when the block was first picked up.
    #[serde(skip)]
    pub snapshot: Option<PixelBuffer>,
    pub moved: bool,
    /// Position before the first move.
    pub original_rect: Option<Rect>,
}

impl Block {
    pub fn new(rect: Rect, label: impl Into<String>, color: Rgb) -> Self {
        Self {
            id: BlockId::unique(),
            rect,
            label: label.into(),
            color,
            snapshot: None,
            moved: false,
            original_rect: None,
        }
    }
}

impl From<&Candidate> for Block {
    fn from(candidate: &Candidate) -> Self {
        Block::new(candidate.rect, candidate.label.clone(), candidate.color)
    }
}

impl KeyIndexKey<BlockId> for Block {
    fn key(&self) -> &BlockId {
        &self.id
    }
}

/// Ordered block collection for one canvas.
///
/// Later blocks are drawn over earlier ones, so hit testing returns the
/// last block containing the point.
#[derive(Debug, Clone)]
pub struct BlockRegistry {
    width: u32,
    height: u32,
    blocks: KeyIndexVec<BlockId, Block>,
}

impl BlockRegistry {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            blocks: KeyIndexVec::default(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        self.blocks.as_slice()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    pub fn get(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.by_key(id)
    }

    pub fn contains(&self, id: &BlockId) -> bool {
        self.blocks.contains_key(id)
    }

    fn check(&self, block: &Block) -> Result<(), RegistryError> {
        if !block.rect.fits_within(self.width, self.height) {
            return Err(RegistryError::OutOfBounds {
                id: block.id,
                rect: block.rect,
                width: self.width,
                height: self.height,
            });
        }
        if block.moved && block.original_rect.is_none() {
            return Err(RegistryError::MissingOriginal(block.id));
        }
        Ok(())
    }

    pub fn append(&mut self, block: Block) -> Result<BlockId, RegistryError> {
        self.check(&block)?;
        let id = block.id;
        self.blocks
            .push(block)
            .map_err(|rejected| RegistryError::DuplicateId(rejected.id))?;
        Ok(id)
    }

    /// Replaces the whole collection. Nothing changes if any block is invalid.
    pub fn replace_all(
        &mut self,
        blocks: impl IntoIterator<Item = Block>,
    ) -> Result<(), RegistryError> {
        let mut next = BlockRegistry::new(self.width, self.height);
        for block in blocks {
            next.append(block)?;
        }
        *self = next;
        Ok(())
    }

    pub fn set_rect(&mut self, id: &BlockId, rect: Rect) -> Result<(), RegistryError> {
        self.ensure_fits(id, rect)?;
        self.blocks
            .update(id, |block| block.rect = rect)
            .ok_or(RegistryError::UnknownBlock(*id))
    }

    pub fn set_snapshot(
        &mut self,
        id: &BlockId,
        snapshot: Option<PixelBuffer>,
    ) -> Result<(), RegistryError> {
        self.blocks
            .update(id, |block| block.snapshot = snapshot)
            .ok_or(RegistryError::UnknownBlock(*id))
    }

    /// Moves a block to `rect`, recording its pre-move rectangle the first
    /// time. `moved` tracks whether it currently sits away from that
    /// original position.
    pub fn relocate(&mut self, id: &BlockId, rect: Rect) -> Result<(), RegistryError> {
        self.ensure_fits(id, rect)?;
        self.blocks
            .update(id, |block| {
                let original = *block.original_rect.get_or_insert(block.rect);
                block.rect = rect;
                block.moved = rect != original;
            })
            .ok_or(RegistryError::UnknownBlock(*id))
    }

    fn ensure_fits(&self, id: &BlockId, rect: Rect) -> Result<(), RegistryError> {
        if rect.fits_within(self.width, self.height) {
            Ok(())
        } else {
            Err(RegistryError::OutOfBounds {
                id: *id,
                rect,
                width: self.width,
                height: self.height,
            })
        }
    }

    pub fn remove(&mut self, id: &BlockId) -> Option<Block> {
        self.blocks.remove_by_key(id)
    }

    /// Removes every block in `ids` in one pass. Returns how many were
    /// registered.
    pub fn remove_all(&mut self, ids: &[BlockId]) -> usize {
        let before = self.blocks.len();
        self.blocks.retain(|block| !ids.contains(&block.id));
        before - self.blocks.len()
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    /// Topmost block containing pixel (`x`, `y`).
    pub fn block_at(&self, x: u32, y: u32) -> Option<&Block> {
        self.blocks
            .iter()
            .rev()
            .find(|block| block.rect.contains(x, y))
    }

    /// Ids of blocks sharing any pixel with `rect`, except `exclude`.
    pub fn overlapping(&self, rect: Rect, exclude: Option<BlockId>) -> Vec<BlockId> {
        self.blocks
            .iter()
            .filter(|block| Some(block.id) != exclude && block.rect.intersects(&rect))
            .map(|block| block.id)
            .collect()
    }
}
