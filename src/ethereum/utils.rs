use alloy::primitives::{Address, U256};
use anyhow::{anyhow, Result};
use std::str::FromStr;

const ETHER_DECIMALS: usize = 18;
const ADDRESS_HEX_DIGITS: usize = 40;

/// Parses a `0x`-prefixed, 40 digit hex address.
///
/// All-lowercase and all-uppercase digits are taken as-is. Mixed case is
/// read as EIP-55 and must carry a valid checksum.
pub fn parse_address(input: &str) -> Result<Address> {
    let input = input.trim();

    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .ok_or_else(|| anyhow!("invalid address '{}': missing 0x prefix", input))?;

    if digits.len() != ADDRESS_HEX_DIGITS || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(anyhow!(
            "invalid address '{}': expected {} hex digits",
            input,
            ADDRESS_HEX_DIGITS
        ));
    }

    let has_lower = digits.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = digits.bytes().any(|b| b.is_ascii_uppercase());

    if has_lower && has_upper {
        return Address::parse_checksummed(format!("0x{}", digits), None)
            .map_err(|_| anyhow!("invalid address '{}': bad address checksum", input));
    }

    Address::from_str(digits).map_err(|e| anyhow!("invalid address '{}': {}", input, e))
}

/// Formats a wei amount in ether, e.g. `1.5` or `0.0`.
///
/// Trailing zeros of the fraction are dropped, but at least one fractional
/// digit is always kept.
pub fn format_ether(wei: U256) -> String {
    let base = U256::from(10u64).pow(U256::from(ETHER_DECIMALS));
    let whole = wei / base;
    let fraction = (wei % base).to_string();

    let padded = format!("{}{}", "0".repeat(ETHER_DECIMALS - fraction.len()), fraction);
    let trimmed = padded.trim_end_matches('0');

    if trimmed.is_empty() {
        format!("{}.0", whole)
    } else {
        format!("{}.{}", whole, trimmed)
    }
}

/// Length of the `0x`-prefixed hex rendering of `code`
pub fn hex_code_length(code: &[u8]) -> usize {
    2 + code.len() * 2
}
