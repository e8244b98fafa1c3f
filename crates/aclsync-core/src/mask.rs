// ── Subnet mask codec ──
//
// The switch reports masks as 32-bit integers (255.255.255.0 = 4294967040).

use crate::error::CoreError;

const HOST_MASK: u32 = u32::MAX;
const ADDRESS_SPACE: u64 = 1 << 32;

/// Convert a 32-bit subnet mask to a CIDR prefix length.
///
/// `4294967296 - mask` must be a power of two; anything else is not a
/// contiguous mask. `0` is the valid `/0` boundary.
pub fn prefix_length(mask: u32) -> Result<u8, CoreError> {
    if mask == HOST_MASK {
        return Ok(32);
    }
    let hosts = ADDRESS_SPACE - u64::from(mask);
    if !hosts.is_power_of_two() {
        return Err(CoreError::InvalidMask { mask });
    }
    // hosts is in 2..=2^32 here
    let length = 32 - hosts.trailing_zeros();
    u8::try_from(length).map_err(|_| CoreError::InvalidMask { mask })
}

/// Convert a CIDR prefix length back to its 32-bit mask.
pub fn mask_for(length: u8) -> Result<u32, CoreError> {
    match length {
        0 => Ok(0),
        1..=32 => Ok(HOST_MASK << (32 - u32::from(length))),
        _ => Err(CoreError::InvalidPrefixLength { length }),
    }
}
