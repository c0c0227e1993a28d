//! Utility functions and helpers

use solana_sdk::pubkey::Pubkey;

use crate::shared::errors::{DappError, DappResult};
use crate::shared::types::LAMPORTS_PER_SOL;

/// Parse a base58 account identity, rejecting anything that is not a 32-byte key.
pub fn parse_address(address: &str) -> DappResult<Pubkey> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(DappError::invalid_address(address, "address is empty"));
    }

    let bytes = bs58::decode(trimmed)
        .into_vec()
        .map_err(|e| DappError::invalid_address(address, format!("not base58: {}", e)))?;

    let key: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| DappError::invalid_address(address, format!("expected 32 bytes, got {}", bytes.len())))?;

    Ok(Pubkey::new_from_array(key))
}

/// Split a decimal UI amount into digit-only whole and fraction parts.
fn split_amount(amount: &str) -> DappResult<(&str, &str)> {
    if amount.is_empty() {
        return Err(DappError::InputValidation("Amount is required".to_string()));
    }
    let invalid = || DappError::InputValidation(format!("Invalid amount: {:?}", amount));

    let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    Ok((whole, fraction))
}

/// Shape and sign check that needs no decimals; precision is left to [`to_base_units`].
pub fn validate_amount(amount: &str) -> DappResult<()> {
    let (whole, fraction) = split_amount(amount.trim())?;
    if whole.chars().chain(fraction.chars()).all(|c| c == '0') {
        return Err(DappError::InputValidation("Amount must be greater than zero".to_string()));
    }
    Ok(())
}

/// Convert a decimal UI amount ("0.01") into base units using exact decimal arithmetic.
pub fn to_base_units(amount: &str, decimals: u8) -> DappResult<u64> {
    let amount = amount.trim();
    let invalid = || DappError::InputValidation(format!("Invalid amount: {:?}", amount));
    let (whole, fraction) = split_amount(amount)?;

    if fraction.len() > decimals as usize {
        return Err(DappError::InputValidation(format!(
            "Amount {} has more than {} decimal places",
            amount, decimals
        )));
    }

    let scale = 10u64
        .checked_pow(decimals as u32)
        .ok_or_else(|| DappError::InputValidation(format!("Unsupported decimals: {}", decimals)))?;

    let whole_units = if whole.is_empty() {
        0
    } else {
        whole.parse::<u64>().map_err(|_| invalid())?
    };

    let padded = format!("{:0<width$}", fraction, width = decimals as usize);
    let fraction_units = if padded.is_empty() {
        0
    } else {
        padded.parse::<u64>().map_err(|_| invalid())?
    };

    let total = whole_units
        .checked_mul(scale)
        .and_then(|v| v.checked_add(fraction_units))
        .ok_or_else(|| DappError::InputValidation(format!("Amount {} is too large", amount)))?;

    if total == 0 {
        return Err(DappError::InputValidation("Amount must be greater than zero".to_string()));
    }

    Ok(total)
}

/// Convert base units back into a UI amount.
pub fn from_base_units(amount: u64, decimals: u8) -> f64 {
    amount as f64 / 10_f64.powi(decimals as i32)
}

pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Balance display used by the dashboard.
pub fn format_sol(sol: f64) -> String {
    format!("{:.4} SOL", sol)
}

/// Shorten an address for log lines.
pub fn short_address(address: &Pubkey) -> String {
    let s = address.to_string();
    if s.len() <= 16 {
        return s;
    }
    format!("{}...{}", &s[..8], &s[s.len() - 8..])
}
