//! Sketch hash functions
//!
//! Bob Jenkins' lookup3 as shipped in the kernel (`jhash`) and Zilong Tan's
//! fast-hash. Both read words in little-endian order so digests match the
//! in-kernel helpers on x86. Input length is bounded by the caller; the
//! loops run at most `len / 12` and `len / 8` times.

/// Kernel `JHASH_INITVAL`
pub const JHASH_INITVAL: u32 = 0xdeadbeef;

const FASTHASH_M: u64 = 0x880355f21e6d1965;

#[inline(always)]
fn word32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[inline(always)]
fn jhash_mix(a: &mut u32, b: &mut u32, c: &mut u32) {
    *a = a.wrapping_sub(*c);
    *a ^= c.rotate_left(4);
    *c = c.wrapping_add(*b);
    *b = b.wrapping_sub(*a);
    *b ^= a.rotate_left(6);
    *a = a.wrapping_add(*c);
    *c = c.wrapping_sub(*b);
    *c ^= b.rotate_left(8);
    *b = b.wrapping_add(*a);
    *a = a.wrapping_sub(*c);
    *a ^= c.rotate_left(16);
    *c = c.wrapping_add(*b);
    *b = b.wrapping_sub(*a);
    *b ^= a.rotate_left(19);
    *a = a.wrapping_add(*c);
    *c = c.wrapping_sub(*b);
    *c ^= b.rotate_left(4);
    *b = b.wrapping_add(*a);
}

#[inline(always)]
fn jhash_final(a: &mut u32, b: &mut u32, c: &mut u32) {
    *c ^= *b;
    *c = c.wrapping_sub(b.rotate_left(14));
    *a ^= *c;
    *a = a.wrapping_sub(c.rotate_left(11));
    *b ^= *a;
    *b = b.wrapping_sub(a.rotate_left(25));
    *c ^= *b;
    *c = c.wrapping_sub(b.rotate_left(16));
    *a ^= *c;
    *a = a.wrapping_sub(c.rotate_left(4));
    *b ^= *a;
    *b = b.wrapping_sub(a.rotate_left(14));
    *c ^= *b;
    *c = c.wrapping_sub(b.rotate_left(24));
}

/// Hash an arbitrary byte key (`jhash(key, len, initval)`)
pub fn jhash(key: &[u8], initval: u32) -> u32 {
    let init = JHASH_INITVAL
        .wrapping_add(key.len() as u32)
        .wrapping_add(initval);
    let (mut a, mut b, mut c) = (init, init, init);

    let mut rest = key;
    while rest.len() > 12 {
        a = a.wrapping_add(word32(&rest[0..4]));
        b = b.wrapping_add(word32(&rest[4..8]));
        c = c.wrapping_add(word32(&rest[8..12]));
        jhash_mix(&mut a, &mut b, &mut c);
        rest = &rest[12..];
    }

    if rest.is_empty() {
        return c;
    }

    // Last 1..=12 bytes, zero-extended into the three words
    let mut tail = [0u32; 3];
    for (i, byte) in rest.iter().enumerate() {
        tail[i / 4] |= (*byte as u32) << (8 * (i % 4));
    }
    a = a.wrapping_add(tail[0]);
    b = b.wrapping_add(tail[1]);
    c = c.wrapping_add(tail[2]);
    jhash_final(&mut a, &mut b, &mut c);

    c
}

#[inline(always)]
fn fasthash_mix(mut h: u64) -> u64 {
    h ^= h >> 23;
    h = h.wrapping_mul(0x2127599bf4325c37);
    h ^= h >> 47;
    h
}

/// 64-bit fast-hash
pub fn fasthash64(buf: &[u8], seed: u64) -> u64 {
    let mut h = seed ^ (buf.len() as u64).wrapping_mul(FASTHASH_M);

    let mut words = buf.chunks_exact(8);
    for word in &mut words {
        let mut v = [0u8; 8];
        v.copy_from_slice(word);
        h ^= fasthash_mix(u64::from_le_bytes(v));
        h = h.wrapping_mul(FASTHASH_M);
    }

    let tail = words.remainder();
    if !tail.is_empty() {
        let mut v = 0u64;
        for (i, byte) in tail.iter().enumerate() {
            v ^= (*byte as u64) << (8 * i);
        }
        h ^= fasthash_mix(v);
        h = h.wrapping_mul(FASTHASH_M);
    }

    fasthash_mix(h)
}

/// 32-bit fast-hash, folded from the 64-bit digest
#[inline]
pub fn fasthash32(buf: &[u8], seed: u64) -> u32 {
    let h = fasthash64(buf, seed);
    h.wrapping_sub(h >> 32) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUOTE: &[u8] = b"Four score and seven years ago";

    #[test]
    fn test_jhash_empty_key() {
        assert_eq!(jhash(&[], 0), 0xdeadbeef);
        assert_eq!(jhash(&[], 0xdeadbeef), 0xbd5b7dde);
    }

    #[test]
    fn test_jhash_lookup3_vectors() {
        assert_eq!(jhash(QUOTE, 0), 0x17770551);
        assert_eq!(jhash(QUOTE, 1), 0xcd628161);
    }

    #[test]
    fn test_jhash_tail_bytes_matter() {
        let mut key = [0u8; 16];
        let base = jhash(&key, 0x2d31e867);
        key[15] = 1;
        assert_ne!(jhash(&key, 0x2d31e867), base);
    }

    #[test]
    fn test_fasthash_seed_and_input() {
        let key = [7u8; 16];
        assert_eq!(fasthash64(&key, 1), fasthash64(&key, 1));
        assert_ne!(fasthash64(&key, 1), fasthash64(&key, 2));
        assert_ne!(fasthash64(&key[..15], 1), fasthash64(&key, 1));
    }

    #[test]
    fn test_fasthash_empty() {
        // No words and no tail: only the final mix runs
        assert_eq!(fasthash64(&[], 0), 0);
        assert_eq!(fasthash64(&[], 5), fasthash_mix(5));
    }

    #[test]
    fn test_fasthash32_fold() {
        let key = b"heavy hitter";
        let h = fasthash64(key, 0xdeadbeef);
        assert_eq!(fasthash32(key, 0xdeadbeef), (h - (h >> 32)) as u32);
    }
}
