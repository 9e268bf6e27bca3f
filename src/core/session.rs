use crate::core::catalog::{TaskCatalog, LOGIN, REGISTER};
use crate::domain::model::Session;
use crate::domain::ports::Executor;
use crate::stats::collector::StatsCollector;
use crate::utils::error::{Result, SwarmError};

/// Registers (when the catalog has a register operation) and logs in,
/// storing the returned bearer token on the session.
///
/// Both requests are recorded like any other task. A failed registration
/// is not fatal since the account may already exist.
pub async fn authenticate<E: Executor + ?Sized>(
    executor: &E,
    catalog: &TaskCatalog,
    stats: &StatsCollector,
    session: &mut Session,
) -> Result<()> {
    if let Some(register) = catalog.get(REGISTER) {
        let outcome = executor.execute(register, session).await;
        stats.record(&outcome.record);
        if let Some(error) = &outcome.record.error {
            tracing::debug!("User {} registration: {}", session.user_id, error);
        }
    }

    let login = catalog.get(LOGIN).ok_or_else(|| SwarmError::AuthenticationError {
        message: format!("catalog has no '{}' operation", LOGIN),
    })?;

    let outcome = executor.execute(login, session).await;
    stats.record(&outcome.record);

    if let Some(error) = outcome.record.error {
        return Err(SwarmError::AuthenticationError { message: error });
    }

    let token = outcome
        .body
        .as_ref()
        .and_then(|body| body.get("token"))
        .and_then(|token| token.as_str())
        .ok_or_else(|| SwarmError::AuthenticationError {
            message: "login response carried no token".to_string(),
        })?;

    session.set_token(token);
    tracing::debug!("User {} authenticated", session.user_id);
    Ok(())
}
