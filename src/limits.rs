/// Minutes in a day; tier bounds and the `24:00` end-of-day time live here.
pub const MINUTES_PER_DAY: u32 = 1440;

pub const MAX_FACILITIES: usize = 10_000;
pub const MAX_NAME_LEN: usize = 256;
pub const MAX_TIERS_PER_POLICY: usize = 96;

/// Date keys are opaque, but still bounded.
pub const MAX_DATE_LEN: usize = 64;

/// Longest request line accepted by the line protocol.
pub const MAX_LINE_LEN: usize = 1024;
