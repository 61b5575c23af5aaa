//! Buzhash rolling checksum.
//!
//! The checksum covers the last `window` bytes fed to it. Sequence chunkers
//! test its low bits after each entry to decide whether a chunk ends there, so
//! the table and the rotation scheme are part of the storage format.

const TABLE: [u32; 256] = build_table();

/// Fill the substitution table from a fixed splitmix64 stream.
const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut state: u64 = 0x6172_626f_725f_6275; // "arbor_bu"
    let mut i = 0;
    while i < 256 {
        state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^= z >> 31;
        table[i] = (z >> 32) as u32;
        i += 1;
    }
    table
}

/// Rolling checksum over a fixed-size byte window.
#[derive(Clone, Debug)]
pub struct RollingHasher {
    ring: Vec<u8>,
    pos: usize,
    filled: usize,
    sum: u32,
}

impl RollingHasher {
    /// Create a hasher over a window of `window` bytes (at least one).
    pub fn new(window: usize) -> Self {
        Self {
            ring: vec![0; window.max(1)],
            pos: 0,
            filled: 0,
            sum: 0,
        }
    }

    /// Window size in bytes.
    pub fn window(&self) -> usize {
        self.ring.len()
    }

    /// Push one byte, evicting the oldest once the window is full.
    pub fn roll(&mut self, byte: u8) {
        let size = self.ring.len();
        self.sum = self.sum.rotate_left(1) ^ TABLE[byte as usize];
        if self.filled == size {
            let out = self.ring[self.pos];
            self.sum ^= TABLE[out as usize].rotate_left((size % 32) as u32);
        } else {
            self.filled += 1;
        }
        self.ring[self.pos] = byte;
        self.pos = (self.pos + 1) % size;
    }

    /// Push every byte of `data`.
    pub fn roll_all(&mut self, data: &[u8]) {
        for &byte in data {
            self.roll(byte);
        }
    }

    /// Current checksum.
    pub fn sum(&self) -> u32 {
        self.sum
    }

    /// Returns `true` when the low `bits` bits of the checksum are all ones.
    pub fn matches_pattern(&self, bits: u32) -> bool {
        let mask = if bits >= 32 { u32::MAX } else { (1u32 << bits) - 1 };
        self.sum & mask == mask
    }

    /// Forget all bytes seen so far.
    pub fn reset(&mut self) {
        self.ring.iter_mut().for_each(|b| *b = 0);
        self.pos = 0;
        self.filled = 0;
        self.sum = 0;
    }
}
