//! Common small functions used throughout the crate
//!
//! These are left public for the convenience of the user, mostly for
//! converting Serpent names into OpenMC ids and tidy number output.

use itertools::Itertools;

// Alias for the format! macro out of laziness
pub use std::format as f;

/// Largest id OpenMC will happily accept (signed 32-bit)
pub const MAX_ID: u32 = 0x7fff_ffff;

/// Deterministic id for a Serpent name
///
/// Serpent names are arbitrary alphanumeric strings while OpenMC needs
/// positive integer ids. Purely numeric names keep their value, anything else
/// is hashed with 32-bit FNV-1a so the same name always maps to the same id.
///
/// ```rust
/// # use geoport::utils::stable_id;
/// assert_eq!(stable_id("42"), 42);
/// assert_eq!(stable_id("fuel"), stable_id("fuel"));
/// assert_ne!(stable_id("fuel"), stable_id("clad"));
/// ```
pub fn stable_id(name: &str) -> u32 {
    if let Ok(id) = name.parse::<u32>() {
        if id <= MAX_ID {
            return id;
        }
    }

    let mut hash: u32 = 0x811c_9dc5;
    for byte in name.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }

    // keep clear of zero and the sign bit
    match hash & MAX_ID {
        0 => 1,
        h => h,
    }
}

/// Space separated list of numbers in the shortest round-trip form
///
/// ```rust
/// # use geoport::utils::join_floats;
/// assert_eq!(join_floats(&[1.0, -0.5, 10.0]), "1 -0.5 10".to_string());
/// ```
pub fn join_floats(values: &[f64]) -> String {
    values.iter().map(|v| f!("{v}")).join(" ")
}
