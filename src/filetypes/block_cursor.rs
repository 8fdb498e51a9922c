use std::ops::RangeInclusive;

use super::BlockCursor;
use crate::structs::BLOCK_SIZE;

impl BlockCursor {
    pub fn new(position: u64) -> Self {
        let mut cursor = Self {
            block_size: BLOCK_SIZE,
            current_block: 0,
            current_byte: 0,
        };
        cursor.set(position);
        cursor
    }

    /// Inclusive range of logical blocks touched by `length` bytes starting at `offset`
    pub fn span(offset: u64, length: u64) -> Option<RangeInclusive<u64>> {
        if length == 0 {
            return None;
        }
        let block_size = BLOCK_SIZE as u64;
        Some(offset / block_size..=(offset + length - 1) / block_size)
    }

    pub fn position(&self) -> u64 {
        self.current_block * self.block_size as u64 + self.current_byte as u64
    }

    pub fn advance(&mut self, bytes: u64) -> u64 {
        self.set(self.position() + bytes)
    }

    pub fn set(&mut self, bytes: u64) -> u64 {
        self.current_block = bytes / self.block_size as u64;
        self.current_byte = (bytes % self.block_size as u64) as usize;
        bytes
    }

    pub fn block(&self) -> u64 {
        self.current_block
    }

    pub fn byte(&self) -> usize {
        self.current_byte
    }

    /// Bytes left until the end of the current block
    pub fn remaining(&self) -> usize {
        self.block_size - self.current_byte
    }
}
