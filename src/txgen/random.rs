use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Deterministic byte source handed to generators. Reads from a buffer that
/// is refilled from a seeded RNG once consumed, so a (seed, buffer length)
/// pair always replays the same byte sequence.
#[derive(Clone, Debug)]
pub struct Filler {
    rng: StdRng,
    buf: Vec<u8>,
    pos: usize,
}

impl Filler {
    pub fn new(seed: u64, buffer_len: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut buf = vec![0u8; buffer_len.max(1)];
        rng.fill_bytes(&mut buf);
        Self { rng, buf, pos: 0 }
    }

    /// Derive a child source from `parent`, one per worker.
    pub fn from_rng<R: Rng>(parent: &mut R, buffer_len: usize) -> Self {
        Self::new(parent.gen(), buffer_len)
    }

    /// Start from fixed bytes. Empty input is clamped to a single zero byte.
    pub fn from_bytes(mut data: Vec<u8>) -> Self {
        if data.is_empty() {
            data.push(0);
        }
        Self { rng: StdRng::seed_from_u64(0), buf: data, pos: 0 }
    }

    pub fn byte(&mut self) -> u8 {
        if self.pos >= self.buf.len() {
            self.rng.fill_bytes(&mut self.buf);
            self.pos = 0;
        }
        let b = self.buf[self.pos];
        self.pos += 1;
        b
    }

    pub fn bytes(&mut self, n: usize) -> Vec<u8> {
        (0..n).map(|_| self.byte()).collect()
    }

    pub fn u16(&mut self) -> u16 {
        u16::from_be_bytes([self.byte(), self.byte()])
    }

    pub fn u64(&mut self) -> u64 {
        let mut b = [0u8; 8];
        for x in b.iter_mut() {
            *x = self.byte();
        }
        u64::from_be_bytes(b)
    }
}
