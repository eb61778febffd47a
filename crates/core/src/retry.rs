// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Bounded retry for read operations.
//!
//! Reads against the backing store retry a transient failure up to
//! [`READ_RETRY_ATTEMPTS`] times with linear backoff. Mutations are NEVER
//! retried: a retried mutation could duplicate its side effect.

use crate::ports::StoreError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Maximum number of attempts for a read operation.
const READ_RETRY_ATTEMPTS: u32 = 3;

/// Delay before the first retry; later retries back off linearly.
const READ_RETRY_BASE_DELAY: Duration = Duration::from_millis(50);

/// Runs a read operation, retrying transient failures.
///
/// Only [`StoreError::Unavailable`] is retried; every other error is
/// returned immediately.
pub(crate) async fn with_read_retry<T, F, Fut>(
    operation_name: &str,
    mut operation: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut attempt: u32 = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(StoreError::Unavailable(message)) if attempt < READ_RETRY_ATTEMPTS => {
                warn!(
                    "read '{operation_name}' attempt {attempt}/{READ_RETRY_ATTEMPTS} failed: \
                     {message}; retrying"
                );
                tokio::time::sleep(READ_RETRY_BASE_DELAY * attempt).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
