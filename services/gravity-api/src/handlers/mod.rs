//! HTTP request handlers for the gravity API.

pub mod health;
pub mod population;
pub mod travel_time;

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use gravity_engine::{QuerySession, Result as EngineResult};

/// Run a query, inside the caller's session when one was given, and record
/// query metrics under `kind`.
pub(crate) async fn run_query<F, T>(
    kind: &'static str,
    session: Option<Arc<QuerySession>>,
    query: F,
) -> EngineResult<T>
where
    F: Future<Output = EngineResult<T>> + Send + 'static,
    T: Send + 'static,
{
    let start = Instant::now();
    let result = match session {
        Some(session) => session.run(query).await,
        None => query.await,
    };

    let outcome = if result.is_ok() { "ok" } else { "error" };
    metrics::counter!("gravity_queries_total", "kind" => kind, "outcome" => outcome).increment(1);
    metrics::histogram!("gravity_query_duration_seconds", "kind" => kind)
        .record(start.elapsed().as_secs_f64());

    result
}
