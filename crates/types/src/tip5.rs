//! The TIP5 sponge used for all structural hashing.
//!
//! A width-16 permutation over the bridge field: rate 10, capacity 6,
//! five rounds, 5-word digests. The first four state words pass through a
//! byte-wise lookup S-box (the bijection `x -> ((x + 1)^3 mod 257) - 1`
//! applied to the canonical little-endian bytes), the remaining twelve
//! through the `x^7` power map, followed by a circulant MDS layer and
//! round-constant injection. The S-box table and the round constants are
//! derived by `const fn` from fixed seeds so the whole function is
//! reproducible from this file alone.

use crate::felt::{Felt, P};

/// Number of field elements in the permutation state.
pub const STATE_WIDTH: usize = 16;
/// Number of state words overwritten per absorbed chunk.
pub const RATE: usize = 10;
/// Number of digest words squeezed from the final state.
pub const DIGEST_WIDTH: usize = 5;

const ROUNDS: usize = 5;
const SPLIT_WORDS: usize = 4;

/// First row of the circulant MDS matrix.
const MDS_FIRST_ROW: [u64; STATE_WIDTH] = [
    61402, 1108, 28750, 33823, 7454, 43244, 53865, 12034, 56951, 27521, 41351, 40901, 12021,
    59689, 26798, 17845,
];

const LOOKUP: [u8; 256] = build_lookup();
const ROUND_CONSTANTS: [[u64; STATE_WIDTH]; ROUNDS] = build_round_constants();

/// Byte S-box: `x -> ((x + 1)^3 mod 257) - 1`. 257 is prime and
/// `gcd(3, 256) = 1`, so the map is a bijection on bytes.
const fn build_lookup() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0usize;
    while i < 256 {
        let x = i as u32 + 1;
        let cube = x * x % 257 * x % 257;
        table[i] = (cube - 1) as u8;
        i += 1;
    }
    table
}

const RC_SEED: u64 = 0x7469_7035_2d72_6300;

const fn splitmix64(state: u64) -> (u64, u64) {
    let next = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = next;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    (next, z ^ (z >> 31))
}

const fn build_round_constants() -> [[u64; STATE_WIDTH]; ROUNDS] {
    let mut out = [[0u64; STATE_WIDTH]; ROUNDS];
    let mut state = RC_SEED;
    let mut round = 0;
    while round < ROUNDS {
        let mut i = 0;
        while i < STATE_WIDTH {
            let (next, sample) = splitmix64(state);
            state = next;
            out[round][i] = sample % P;
            i += 1;
        }
        round += 1;
    }
    out
}

fn split_and_lookup(word: Felt) -> Felt {
    let mut bytes = word.value().to_le_bytes();
    for byte in &mut bytes {
        *byte = LOOKUP[*byte as usize];
    }
    Felt::reduce(u64::from_le_bytes(bytes) as u128)
}

fn sbox_layer(state: &mut [Felt; STATE_WIDTH]) {
    for word in state.iter_mut().take(SPLIT_WORDS) {
        *word = split_and_lookup(*word);
    }
    for word in state.iter_mut().skip(SPLIT_WORDS) {
        *word = word.pow7();
    }
}

fn mds_layer(state: &mut [Felt; STATE_WIDTH]) {
    let mut next = [Felt::ZERO; STATE_WIDTH];
    for (i, slot) in next.iter_mut().enumerate() {
        let mut acc = Felt::ZERO;
        for (j, word) in state.iter().enumerate() {
            let coeff = MDS_FIRST_ROW[(STATE_WIDTH + j - i) % STATE_WIDTH];
            acc = acc + *word * Felt::reduce(coeff as u128);
        }
        *slot = acc;
    }
    *state = next;
}

/// One application of the full permutation.
pub fn permute(state: &mut [Felt; STATE_WIDTH]) {
    for constants in &ROUND_CONSTANTS {
        sbox_layer(state);
        mds_layer(state);
        for (word, constant) in state.iter_mut().zip(constants) {
            *word = *word + Felt::reduce(*constant as u128);
        }
    }
}

/// Hashes a variable-length sequence of field elements.
///
/// The input is padded with a single one followed by zeros up to a rate
/// boundary, then absorbed in overwrite mode. Pure and total: equal inputs
/// always produce equal digests.
pub fn hash_varlen(input: &[Felt]) -> [Felt; DIGEST_WIDTH] {
    let mut padded = Vec::with_capacity(input.len() + RATE);
    padded.extend_from_slice(input);
    padded.push(Felt::ONE);
    while padded.len() % RATE != 0 {
        padded.push(Felt::ZERO);
    }

    let mut state = [Felt::ZERO; STATE_WIDTH];
    for chunk in padded.chunks(RATE) {
        state[..RATE].copy_from_slice(chunk);
        permute(&mut state);
    }

    let mut digest = [Felt::ZERO; DIGEST_WIDTH];
    digest.copy_from_slice(&state[..DIGEST_WIDTH]);
    digest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_table_is_a_bijection() {
        let mut seen = [false; 256];
        for entry in LOOKUP {
            seen[entry as usize] = true;
        }
        assert!(seen.iter().all(|hit| *hit));
    }

    #[test]
    fn round_constants_are_canonical() {
        for round in &ROUND_CONSTANTS {
            for constant in round {
                assert!(*constant < P);
            }
        }
    }

    #[test]
    fn hashing_is_deterministic() {
        let input: Vec<Felt> = (0..7).map(|i| Felt::reduce(i * 1_000_003)).collect();
        assert_eq!(hash_varlen(&input), hash_varlen(&input));
    }

    #[test]
    fn distinct_inputs_hash_differently() {
        let a = hash_varlen(&[Felt::reduce(1)]);
        let b = hash_varlen(&[Felt::reduce(2)]);
        assert_ne!(a, b);
    }

    #[test]
    fn padding_separates_trailing_zeros() {
        let short = hash_varlen(&[Felt::reduce(9)]);
        let long = hash_varlen(&[Felt::reduce(9), Felt::ZERO]);
        assert_ne!(short, long);
    }

    #[test]
    fn empty_input_hashes() {
        let digest = hash_varlen(&[]);
        assert_ne!(digest, [Felt::ZERO; DIGEST_WIDTH]);
    }

    #[test]
    fn digest_words_are_canonical() {
        let digest = hash_varlen(&[Felt::reduce(0xdead_beef)]);
        for word in digest {
            assert!(word.value() < P);
        }
    }
}
