use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// Trend classification
pub const TREND_WINDOW: usize = 6;
pub const TREND_MIN_POINTS: usize = TREND_WINDOW + 3;
pub const TREND_RISING_THRESHOLD: Decimal = dec!(0.05);
pub const TREND_FALLING_THRESHOLD: Decimal = dec!(-0.05);

// Valuation-ratio bands (price-to-book equivalent)
pub const VALUATION_DISCOUNT_BELOW: Decimal = dec!(0.95);
pub const VALUATION_FAIR_UPTO: Decimal = dec!(1.05);

// Risk signal thresholds
pub const LIQUIDITY_RISK_FLOOR: Decimal = dec!(50_000);
pub const LIQUIDITY_RISK_COMFORT: Decimal = dec!(200_000);
pub const CONSISTENCY_RISK_FLOOR: Decimal = dec!(50);
pub const CONSISTENCY_RISK_COMFORT: Decimal = dec!(80);
pub const HOLDER_COUNT_RISK_FLOOR: i64 = 5_000;
pub const HOLDER_COUNT_RISK_COMFORT: i64 = 20_000;

// Average signal score boundaries
pub const RISK_LOW_BELOW: Decimal = dec!(0.5);
pub const RISK_MEDIUM_BELOW: Decimal = dec!(1.5);
