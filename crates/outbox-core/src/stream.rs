//! Stream adapters shared by the observers.

use std::future;

use futures::{Stream, StreamExt};

/// Suppresses values equal to the one emitted immediately before.
///
/// Comparison is structural (`PartialEq`) against the last `Ok` value that
/// passed through. `Err` items are forwarded untouched and leave that memory
/// as it was, so an error between two equal values does not cause the second
/// one to be re-emitted.
///
/// The memory lives inside the returned stream: every call starts fresh and
/// nothing is shared between subscriptions. Ordering is preserved.
///
/// # Example
///
/// ```ignore
/// let values = stream::iter([Ok::<_, ()>(1), Ok(1), Ok(2), Ok(1)]);
/// let distinct: Vec<_> = distinct_until_changed(values).collect().await;
/// assert_eq!(distinct, vec![Ok(1), Ok(2), Ok(1)]);
/// ```
pub fn distinct_until_changed<S, T, E>(stream: S) -> impl Stream<Item = Result<T, E>>
where
    S: Stream<Item = Result<T, E>>,
    T: Clone + PartialEq,
{
    stream
        .scan(None::<T>, |last, item| {
            let passed = match item {
                Ok(value) if last.as_ref() == Some(&value) => None,
                Ok(value) => {
                    *last = Some(value.clone());
                    Some(Ok(value))
                }
                Err(error) => Some(Err(error)),
            };
            future::ready(Some(passed))
        })
        .filter_map(future::ready)
}
