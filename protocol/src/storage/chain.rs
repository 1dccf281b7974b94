//! In-memory hash chain with the append and verify protocol.
//!
//! A [`Chain`] always holds at least the genesis block. New blocks enter only
//! through [`Chain::append`] (or [`Chain::write`], which derives the candidate
//! from the tail first), and only after validating against the tail. Stored
//! blocks are handed out by shared reference; nothing outside this module can
//! mutate them.
//!
//! The chain does no locking. Callers that share one across threads wrap the
//! whole value in a single mutex so that read-tail, validate and push happen
//! under one guard.

use std::io;

use super::block::{Block, InvalidBlock};

/// Ordered, append-only sequence of blocks rooted at a genesis block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    // Never empty: index 0 is genesis.
    blocks: Vec<Block>,
}

impl Chain {
    /// Create a chain holding only a freshly stamped genesis block.
    pub fn genesis() -> Self {
        Self {
            blocks: vec![Block::genesis()],
        }
    }

    /// Rebuild a chain from blocks read back from storage.
    ///
    /// The first block must be a genesis block (index 0, no previous hash);
    /// `verify` only links neighbours, so it cannot catch a missing root.
    /// Nothing past the root is validated here; run [`Chain::verify`] or
    /// [`Chain::audit`] on the result. Returns `None` for an empty list or a
    /// list not rooted at genesis.
    pub fn restore(blocks: Vec<Block>) -> Option<Self> {
        if !blocks.first().is_some_and(Block::is_genesis) {
            return None;
        }
        Some(Self { blocks })
    }

    /// Append `candidate` if it is a valid successor of the current tail.
    ///
    /// On rejection the chain is left exactly as it was.
    pub fn append(&mut self, candidate: Block) -> Result<(), InvalidBlock> {
        candidate.validate_against(self.tail())?;
        self.blocks.push(candidate);
        Ok(())
    }

    /// Derive a successor of the tail carrying `payload` and append it.
    ///
    /// Returns the number of payload bytes accepted. The derived block is
    /// never visible to the caller unless it was appended.
    pub fn write(&mut self, payload: &[u8]) -> Result<usize, InvalidBlock> {
        let candidate = self.tail().successor(payload);
        self.append(candidate)?;
        Ok(payload.len())
    }

    /// Re-validate every block against its predecessor.
    ///
    /// Genesis has no predecessor and is skipped.
    pub fn verify(&self) -> bool {
        self.audit().is_ok()
    }

    /// [`Chain::verify`], reporting the first broken block.
    pub fn audit(&self) -> Result<(), InvalidBlock> {
        self.blocks
            .windows(2)
            .try_for_each(|pair| pair[1].validate_against(&pair[0]))
    }

    /// The most recently appended block.
    pub fn tail(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    /// The root block.
    pub fn genesis_block(&self) -> &Block {
        &self.blocks[0]
    }

    /// Look up a block by position.
    pub fn get(&self, index: u64) -> Option<&Block> {
        usize::try_from(index).ok().and_then(|i| self.blocks.get(i))
    }

    /// All blocks, genesis first.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Iterate over the blocks in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Index of the tail block.
    pub fn height(&self) -> u64 {
        self.tail().index
    }

    /// Give up the chain and take its blocks.
    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }
}

impl<'a> IntoIterator for &'a Chain {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

/// Each `write` call appends one block holding the whole buffer.
impl io::Write for Chain {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Chain::write(self, buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
