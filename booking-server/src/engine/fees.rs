//! Access fee calculation.
//!
//! The access fee is what the customer pays up front to lock in a
//! discounted slot: 20% of the discount value, floored at 1.00, rounded
//! to cents.

use rust_decimal::Decimal;

/// Fee floor: no access fee is ever below this.
pub fn minimum_fee() -> Decimal {
    Decimal::new(100, 2)
}

/// Fraction of the discount value charged as the access fee.
fn fee_rate() -> Decimal {
    Decimal::new(20, 2)
}

/// Compute the access fee for a discounted booking.
///
/// `discount_percent` outside the open interval (0, 100) means corrupt
/// offer data; the fee falls back to the floor so bad rows never block a
/// booking or produce a negative charge.
pub fn access_fee(price: Decimal, discount_percent: Decimal) -> Decimal {
    if price <= Decimal::ZERO
        || discount_percent <= Decimal::ZERO
        || discount_percent >= Decimal::new(100, 0)
    {
        tracing::warn!(%price, %discount_percent, "Unusable fee inputs, charging floor fee");
        return minimum_fee();
    }

    let discount_value = price * discount_percent / Decimal::new(100, 0);
    let fee = (discount_value * fee_rate()).round_dp(2);
    fee.max(minimum_fee())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn standard_fee() {
        // 50.00 at 30% off: discount value 15.00, fee 3.00
        assert_eq!(access_fee(dec("50.00"), dec("30")), dec("3.00"));
    }

    #[test]
    fn fee_is_floored() {
        // 10.00 at 10% off: discount value 1.00, raw fee 0.20 -> floor 1.00
        assert_eq!(access_fee(dec("10.00"), dec("10")), dec("1.00"));
    }

    #[test]
    fn fee_rounds_to_cents() {
        // 33.33 at 30% off: discount 9.999, raw fee 1.9998 -> 2.00
        assert_eq!(access_fee(dec("33.33"), dec("30")), dec("2.00"));
    }

    #[test]
    fn bad_inputs_fall_back_to_floor() {
        assert_eq!(access_fee(dec("50.00"), dec("0")), dec("1.00"));
        assert_eq!(access_fee(dec("50.00"), dec("-5")), dec("1.00"));
        assert_eq!(access_fee(dec("50.00"), dec("150")), dec("1.00"));
        assert_eq!(access_fee(dec("0"), dec("30")), dec("1.00"));
    }

    #[test]
    fn discount_bounds_are_exclusive() {
        // The legal interval is open: 100% is defective data, not a free
        // service, and takes the fallback like any other bad row
        assert_eq!(access_fee(dec("80.00"), dec("100")), dec("1.00"));
        assert_eq!(access_fee(dec("80.00"), dec("99.99")), dec("16.00"));
    }
}
