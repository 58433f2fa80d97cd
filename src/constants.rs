/// Decimal places used when rounding monetary values for display.
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Live quote cache TTL (short, bounds provider load during market hours).
pub const QUOTE_CACHE_TTL_SECS: u64 = 15 * 60;

/// Reference/catalog data cache TTL (distribution histories, profiles).
pub const REFERENCE_CACHE_TTL_SECS: u64 = 24 * 60 * 60;

/// How far back the distribution sweep looks for recently paid announcements.
pub const SWEEP_LOOKBACK_DAYS: i64 = 10;

/// Trailing window for "distributions received" in portfolio metrics.
pub const TRAILING_INCOME_MONTHS: i64 = 12;

/// Origin tag for user-entered credited distributions.
pub const ORIGIN_MANUAL: &str = "manual";

/// Origin tag for distributions sourced from the quote provider feed.
pub const ORIGIN_QUOTE_FEED: &str = "brapi";

/// Origin tag for distributions sourced from the indicators scraper.
pub const ORIGIN_INDICATOR_FEED: &str = "fundsexplorer";

// Scraper politeness: minimum gap between requests to the indicators source.
pub const SCRAPE_MIN_INTERVAL_MS: u64 = 1_500;
pub const SCRAPE_MAX_RETRIES: u32 = 3;
pub const SCRAPE_TIMEOUT_SECS: u64 = 20;

pub const QUOTE_REQUEST_TIMEOUT_SECS: u64 = 15;

// Scheduler cadence.
pub const QUOTE_REFRESH_INTERVAL_SECS: u64 = 30 * 60;
pub const DISTRIBUTION_SWEEP_INTERVAL_SECS: u64 = 12 * 60 * 60;
pub const SCHEDULER_INITIAL_DELAY_SECS: u64 = 60;

/// B3 trading window, local São Paulo time.
pub const TRADING_WINDOW_OPEN_HOUR: u32 = 10;
pub const TRADING_WINDOW_CLOSE_HOUR: u32 = 18;
