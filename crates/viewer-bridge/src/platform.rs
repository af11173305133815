//! Timers for native and browser builds

use std::future::Future;
use std::time::Duration;

use futures::future::{select, Either};

#[cfg(not(target_arch = "wasm32"))]
pub async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await;
}

#[cfg(target_arch = "wasm32")]
pub async fn sleep(duration: Duration) {
    let millis = duration.as_millis().min(i32::MAX as u128) as i32;
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        if let Some(window) = web_sys::window() {
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                &resolve,
                millis,
            );
        }
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}

/// Run `future` to completion unless `duration` elapses first
pub async fn timeout<F: Future>(duration: Duration, future: F) -> Option<F::Output> {
    let future = Box::pin(future);
    let timer = Box::pin(sleep(duration));
    match select(future, timer).await {
        Either::Left((output, _)) => Some(output),
        Either::Right(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timeout_elapses() {
        let never = futures::future::pending::<()>();
        assert_eq!(timeout(Duration::from_millis(50), never).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_passes_output() {
        let ready = async { 7 };
        assert_eq!(timeout(Duration::from_secs(1), ready).await, Some(7));
    }
}
