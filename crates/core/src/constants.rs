/// Operator flag value marking the opening entry of an account.
pub const OPENING_FLAG: &str = "CWO";

/// Tolerance for balance-progression checks, matching fixed-point
/// rounding at two decimals.
pub const BALANCE_TOLERANCE: &str = "0.01";

/// Decimal precision for stored balances.
pub const BALANCE_DECIMAL_PRECISION: u32 = 2;
