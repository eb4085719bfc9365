/* src/cli/export/src/pool.rs */

use std::future::Future;

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;

/// Concurrency used when the caller passes `None` or `0`.
pub const DEFAULT_CONCURRENCY: usize = 10;

pub fn effective_concurrency(requested: Option<usize>) -> usize {
  match requested {
    Some(n) if n > 0 => n,
    _ => DEFAULT_CONCURRENCY,
  }
}

/// Run `tasks` with at most `concurrency` in flight at once.
///
/// A task is only invoked once a slot is free, so tasks queued behind a
/// failure are never started. On the first `Err` the pool returns that error
/// immediately and drops whatever is still in flight rather than letting
/// siblings run to completion with their results ignored; a failing worker
/// exits right away, so no caller can tell the two apart. On success the results
/// come back in submission order; side effects inside tasks happen in
/// completion order.
pub async fn pool_all<I, F, Fut, T, E>(tasks: I, concurrency: Option<usize>) -> Result<Vec<T>, E>
where
  I: IntoIterator<Item = F>,
  F: FnOnce() -> Fut,
  Fut: Future<Output = Result<T, E>>,
{
  let limit = effective_concurrency(concurrency);
  let mut queue = tasks.into_iter().enumerate();
  let mut in_flight = FuturesUnordered::new();
  let mut results: Vec<Option<T>> = Vec::new();

  loop {
    while in_flight.len() < limit {
      let Some((index, task)) = queue.next() else { break };
      results.push(None);
      let fut = task();
      in_flight.push(async move { (index, fut.await) });
    }

    match in_flight.next().await {
      Some((index, Ok(value))) => results[index] = Some(value),
      Some((_, Err(err))) => return Err(err),
      None => break,
    }
  }

  Ok(results.into_iter().flatten().collect())
}
