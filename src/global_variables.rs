// Traffic light phase bounds (milliseconds)
pub const PHASE_MIN_MS: u64 = 4000;
pub const PHASE_MAX_MS: u64 = 6000;

// Artificial transmission latency applied to every phase broadcast
pub const PHASE_SEND_DELAY_MS: u64 = 100;

// Demo simulation defaults
pub const DEFAULT_GRID_ROWS: u32 = 2;
pub const DEFAULT_GRID_COLS: u32 = 2;
pub const DEFAULT_VEHICLE_COUNT: usize = 6;
pub const DEFAULT_CROSSING_MS: u64 = 500;
pub const DEFAULT_TRAVEL_MS: u64 = 1500;
pub const DEFAULT_RUN_SECONDS: u64 = 30;

// Monitoring
pub const STATUS_REPORT_INTERVAL_MS: u64 = 2000;
pub const STALL_THRESHOLD_MS: u64 = 15000;
