/// Environment variable selecting environment-only resolution.
pub const ENVIRONMENT_CONFIG: &str = "ENVIRONMENT_CONFIG";

/// Value of [`ENVIRONMENT_CONFIG`] (compared case-insensitively) that skips the config file.
pub const ENVIRONMENT_ONLY: &str = "TRUE";
