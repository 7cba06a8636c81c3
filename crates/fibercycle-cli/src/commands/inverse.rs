use fibercycle_core::modular::{is_prime, mul_mod};
use fibercycle_core::{SimError, inverse_of_two};

/// `inverse_of_two(p)` and `2 * inv mod p`, for an odd prime `p`.
pub fn checked_inverse(prime: i64) -> Result<(i64, u64), SimError> {
    if prime < 3 {
        return Err(SimError::InvalidConfig(format!(
            "modulus must be an odd prime >= 3, got {prime}"
        )));
    }
    if !is_prime(prime as u64) {
        return Err(SimError::NonPrimeModulus(prime));
    }
    let inv = inverse_of_two(prime);
    Ok((inv, mul_mod(2, inv as u64, prime as u64)))
}

pub fn run(prime: i64) -> Result<(), SimError> {
    let (inv, product) = checked_inverse(prime)?;
    println!("inverse_of_two({prime}) = {inv}");
    println!("check: 2 * {inv} mod {prime} = {product}");
    if product != 1 {
        return Err(SimError::InvalidConfig(format!(
            "2 * {inv} mod {prime} is {product}, not 1"
        )));
    }
    Ok(())
}
