//! Transaction helper macro.
//!
//! Transactions are pass-through: [`StatementFactory::begin`],
//! [`commit`](crate::StatementFactory::commit) and
//! [`rollback`](crate::StatementFactory::rollback) go straight to the driver.
//! For commit/rollback handling around a block, use [`transaction!`].
//!
//! [`StatementFactory::begin`]: crate::StatementFactory::begin

/// Runs the given block inside a transaction on a [`StatementFactory`](crate::StatementFactory).
///
/// - Begins via `$factory.begin().await`.
/// - Commits on `Ok(_)`.
/// - Rolls back on `Err(_)`; a failed rollback is reported as
///   [`QueryError::RollbackFailed`](crate::QueryError::RollbackFailed).
///
/// The block must evaluate to `fluentsql::QueryResult<T>`; spell out the
/// error type on the final expression (`Ok::<_, QueryError>(..)`) when the
/// block uses `?`.
///
/// # Example
///
/// ```ignore
/// fluentsql::transaction!(factory, {
///     factory.query().update("accounts").set("balance", 90).and_where("id", "=", 1)?.exec().await?;
///     factory.query().update("accounts").set("balance", 110).and_where("id", "=", 2)?.exec().await?;
///     Ok::<_, fluentsql::QueryError>(())
/// })?;
/// ```
#[macro_export]
macro_rules! transaction {
    ($factory:expr, $body:block) => {{
        let __fluentsql_factory = &$factory;
        __fluentsql_factory.begin().await?;

        let __fluentsql_tx_body_result: $crate::QueryResult<_> = async { $body }.await;
        match __fluentsql_tx_body_result {
            Ok(value) => {
                __fluentsql_factory.commit().await?;
                Ok(value)
            }
            Err(error) => match __fluentsql_factory.rollback().await {
                Ok(()) => Err(error),
                Err(rollback) => Err($crate::QueryError::RollbackFailed {
                    error: Box::new(error),
                    rollback: Box::new(rollback),
                }),
            },
        }
    }};
}
