// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display and platform directories)
pub const APP_NAME: &str = "UserQuery";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "userquery";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".userquery";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "userquery.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "USERQUERY_CONFIG";

// =============================================================================
// Environment Variables
// =============================================================================

/// Environment variable for log filter (falls back to RUST_LOG)
pub const ENV_LOG: &str = "USERQUERY_LOG";

/// Environment variable for data directory override
pub const ENV_DATA_DIR: &str = "USERQUERY_DATA_DIR";

/// Environment variable for the SQLite database file
pub const ENV_DB: &str = "USERQUERY_DB";

/// Environment variable for the null-safe ordering function
pub const ENV_NULL_SAFE_FUNCTION: &str = "USERQUERY_NULL_SAFE_FUNCTION";

/// Environment variable for the maximum page size
pub const ENV_MAX_PAGE_SIZE: &str = "USERQUERY_MAX_PAGE_SIZE";

// =============================================================================
// SQLite
// =============================================================================

/// SQLite database file name inside the data directory
pub const SQLITE_DB_FILENAME: &str = "userquery.db";

/// SQLite connection pool size
pub const SQLITE_MAX_CONNECTIONS: u32 = 5;

/// SQLite busy timeout
pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Query Compilation
// =============================================================================

/// Function wrapped around null-safe ORDER BY terms
pub const DEFAULT_NULL_SAFE_FUNCTION: &str = "IFNULL";

/// Largest page size accepted by the compiler
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 500;

/// Catalog name of the user listing query
pub const QUERY_LIST_USERS: &str = "list_users";
