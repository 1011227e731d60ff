//! Builder configuration shared by every statement a factory produces.

use crate::client::FetchShape;

/// Default number of rows per INSERT statement for batch inserts.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default number of page links emitted on each side of the current page.
pub const DEFAULT_LINK_RADIUS: u64 = 5;

/// Default truncation length for SQL text in log events.
pub const DEFAULT_MAX_LOGGED_SQL: usize = 200;

/// Configuration for [`StatementFactory`](crate::StatementFactory).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderConfig {
    /// Maximum rows rendered into a single INSERT statement.
    pub chunk_size: usize,
    /// How result rows are materialized.
    pub fetch_shape: FetchShape,
    /// Pagination link window radius.
    pub link_radius: u64,
    /// Truncate SQL in log events to this many characters (`None` keeps everything).
    pub max_logged_sql: Option<usize>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            fetch_shape: FetchShape::Object,
            link_radius: DEFAULT_LINK_RADIUS,
            max_logged_sql: Some(DEFAULT_MAX_LOGGED_SQL),
        }
    }
}

impl BuilderConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the batch insert chunk size. Zero is treated as one.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    /// Set the default fetch shape.
    pub fn fetch_shape(mut self, shape: FetchShape) -> Self {
        self.fetch_shape = shape;
        self
    }

    /// Set the pagination link window radius.
    pub fn link_radius(mut self, radius: u64) -> Self {
        self.link_radius = radius;
        self
    }

    /// Set (or disable with `None`) SQL truncation in log events.
    pub fn max_logged_sql(mut self, max: Option<usize>) -> Self {
        self.max_logged_sql = max;
        self
    }
}

/// Shorten `sql` for logging, respecting char boundaries.
pub(crate) fn truncate_sql(sql: &str, max: Option<usize>) -> std::borrow::Cow<'_, str> {
    match max {
        Some(max) if sql.chars().count() > max => {
            let cut: String = sql.chars().take(max).collect();
            std::borrow::Cow::Owned(format!("{cut}..."))
        }
        _ => std::borrow::Cow::Borrowed(sql),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = BuilderConfig::default();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.fetch_shape, FetchShape::Object);
        assert_eq!(config.link_radius, 5);
        assert_eq!(config.max_logged_sql, Some(200));
    }

    #[test]
    fn setters_chain() {
        let config = BuilderConfig::new()
            .chunk_size(0)
            .fetch_shape(FetchShape::Row)
            .link_radius(2)
            .max_logged_sql(None);
        assert_eq!(config.chunk_size, 1);
        assert_eq!(config.fetch_shape, FetchShape::Row);
        assert_eq!(config.link_radius, 2);
        assert_eq!(config.max_logged_sql, None);
    }

    #[test]
    fn truncation() {
        assert_eq!(truncate_sql("SELECT 1", Some(20)), "SELECT 1");
        assert_eq!(truncate_sql("SELECT 1", Some(3)), "SEL...");
        assert_eq!(truncate_sql("SELECT 1", None), "SELECT 1");
        assert_eq!(truncate_sql("ééé", Some(2)), "éé...");
    }
}
