//! Cent amounts shared by invoicing, loyalty and promotions.

/// Largest amount accepted anywhere money enters the system: one billion
/// currency units.
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000_000;

/// `percent` of `amount_cents`, rounded down.
///
/// Splits the amount into whole hundreds and a remainder so the product
/// never leaves `i64` for any non-negative amount and a percent in
/// `0..=100`. Negative amounts count as zero.
pub fn percent_of(amount_cents: i64, percent: i64) -> i64 {
    let amount = amount_cents.max(0);
    let percent = percent.clamp(0, 100);
    amount / 100 * percent + amount % 100 * percent / 100
}
