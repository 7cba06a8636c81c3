//! Modular arithmetic helpers for the fiber recurrence.
//!
//! All products go through `u128`, so every helper is exact for any modulus
//! that fits in an `i64`.

/// Witness set that makes Miller–Rabin deterministic for every `u64`.
const MR_WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// `(a * b) mod m` without intermediate overflow.
pub fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    ((a as u128 * b as u128) % m as u128) as u64
}

/// Square-and-multiply modular exponentiation.
pub fn mod_pow(mut base: u64, mut exp: u64, modulus: u64) -> u64 {
    if modulus == 1 {
        return 0;
    }
    let mut result: u64 = 1;
    base %= modulus;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mul_mod(result, base, modulus);
        }
        exp >>= 1;
        base = mul_mod(base, base, modulus);
    }
    result
}

/// Multiplicative inverse of 2 modulo `prime`, via Fermat: `2^(p-2) mod p`.
///
/// The modulus is not checked. For a non-prime (or `prime < 3`) the result
/// is meaningless; [`crate::SimulationConfig::validate`] rejects those before
/// an engine is ever built.
pub fn inverse_of_two(prime: i64) -> i64 {
    let p = prime as u64;
    mod_pow(2, p.wrapping_sub(2), p) as i64
}

/// Deterministic primality test for 64-bit integers.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    for &p in &MR_WITNESSES {
        if n % p == 0 {
            return n == p;
        }
    }

    let mut d = n - 1;
    let mut s = 0u32;
    while d % 2 == 0 {
        d /= 2;
        s += 1;
    }

    'witness: for &a in &MR_WITNESSES {
        let mut x = mod_pow(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}
