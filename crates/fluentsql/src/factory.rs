//! Statement factory: shared configuration, fresh statements.

use crate::client::Driver;
use crate::config::BuilderConfig;
use crate::dialect::Dialect;
use crate::error::QueryResult;
use crate::query::Query;
use crate::tables::TableRegistry;
use std::fmt;
use std::sync::Arc;

/// Produces independent [`Query`] builders over one driver, dialect and table registry.
///
/// Every statement from [`query`](Self::query) starts empty; only the shared
/// configuration is carried over. The driver is shared by reference between
/// all statements, so interleaving statements on one connection (and the
/// transaction scope that implies) is up to the caller.
///
/// # Example
/// ```ignore
/// let mut tables = TableRegistry::new(IdentStyle::DoubleQuote);
/// tables.add_table("users", ["id", "username", "email"]);
///
/// let factory = StatementFactory::new(client, PostgresDialect, tables);
/// let users = factory
///     .query()
///     .select("id, username")
///     .from(&factory.tables().table("users")?)
///     .fetch_result()
///     .await?;
/// ```
pub struct StatementFactory<C> {
    driver: Arc<C>,
    dialect: Arc<dyn Dialect>,
    tables: Arc<TableRegistry>,
    config: Arc<BuilderConfig>,
}

impl<C> Clone for StatementFactory<C> {
    fn clone(&self) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
            dialect: Arc::clone(&self.dialect),
            tables: Arc::clone(&self.tables),
            config: Arc::clone(&self.config),
        }
    }
}

impl<C> fmt::Debug for StatementFactory<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatementFactory")
            .field("dialect", &self.dialect.name())
            .field("tables", &self.tables)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<C: Driver> StatementFactory<C> {
    /// Create a factory with the default [`BuilderConfig`].
    pub fn new(driver: C, dialect: impl Dialect + 'static, tables: TableRegistry) -> Self {
        Self::with_config(driver, dialect, tables, BuilderConfig::default())
    }

    /// Create a factory with an explicit [`BuilderConfig`].
    ///
    /// The registry is switched to the dialect's quoting style so registry
    /// columns and dialect-rendered clauses agree.
    pub fn with_config(
        driver: C,
        dialect: impl Dialect + 'static,
        mut tables: TableRegistry,
        config: BuilderConfig,
    ) -> Self {
        let style = dialect.ident_style();
        if tables.style() != style {
            tracing::warn!(
                target: "fluentsql::sql",
                dialect = dialect.name(),
                registry = ?tables.style(),
                dialect_style = ?style,
                "table registry quoting differs from the dialect; using the dialect's"
            );
            tables.set_style(style);
        }
        Self {
            driver: Arc::new(driver),
            dialect: Arc::new(dialect),
            tables: Arc::new(tables),
            config: Arc::new(config),
        }
    }

    /// A fresh, empty statement.
    pub fn query(&self) -> Query<C> {
        Query::new(
            Arc::clone(&self.driver),
            Arc::clone(&self.dialect),
            Arc::clone(&self.tables),
            Arc::clone(&self.config),
        )
    }

    pub async fn begin(&self) -> QueryResult<()> {
        self.driver.begin().await
    }

    pub async fn commit(&self) -> QueryResult<()> {
        self.driver.commit().await
    }

    pub async fn rollback(&self) -> QueryResult<()> {
        self.driver.rollback().await
    }
}

impl<C> StatementFactory<C> {
    pub fn tables(&self) -> &TableRegistry {
        &self.tables
    }

    /// Mutable access to the table registry.
    ///
    /// Statements already handed out keep the registry they were created with.
    pub fn tables_mut(&mut self) -> &mut TableRegistry {
        Arc::make_mut(&mut self.tables)
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn driver(&self) -> &C {
        &self.driver
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }
}
