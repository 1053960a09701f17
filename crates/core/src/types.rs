/// Planet identifiers are opaque strings (UUID v4 for records created here).
pub type PlanetId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
