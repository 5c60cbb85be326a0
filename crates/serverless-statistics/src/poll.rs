// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::error::BackendError;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

/// Repeatedly sleeps `interval` and then calls `check` until it yields a
/// value or fails.
///
/// The whole wait, checks included, is bounded by `deadline`
/// ([`BackendError::PollTimeout`]) and by `cancel`
/// ([`BackendError::Cancelled`]); whichever fires first wins.
pub async fn wait_for_completion<T, F, Fut>(
    interval: Duration,
    deadline: Duration,
    cancel: &CancellationToken,
    mut check: F,
) -> Result<T, BackendError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, BackendError>>,
{
    let poll_loop = async {
        loop {
            sleep(interval).await;
            if let Some(done) = check().await? {
                return Ok::<T, BackendError>(done);
            }
        }
    };

    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(BackendError::Cancelled),
        outcome = timeout(deadline, poll_loop) => match outcome {
            Ok(result) => result,
            Err(_) => Err(BackendError::PollTimeout(deadline)),
        },
    }
}
