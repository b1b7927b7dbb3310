use futures::FutureExt;
use std::panic::AssertUnwindSafe;

/// Run a future, converting a panic into its message.
///
/// A panicking fetch task would otherwise vanish without reporting back,
/// leaving `is_loading` or `is_loading_more` stuck at true.
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic payload".to_string()
            }
        })
}

/// Flatten a caught task outcome into the message stored in `ViewState::error`.
pub(super) fn fold_outcome<T, E: std::fmt::Display>(
    task: &'static str,
    outcome: Result<Result<T, E>, String>,
) -> Result<T, String> {
    match outcome {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            tracing::warn!(task, error = %e, "Catalog request failed");
            Err(e.to_string())
        }
        Err(panic) => {
            tracing::error!(task, error = %panic, "Background task panicked");
            Err(format!("Internal error in {} task: {}", task, panic))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catch_task_panic_passes_value() {
        assert_eq!(catch_task_panic(async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn test_catch_task_panic_captures_message() {
        let result = catch_task_panic(async {
            if true {
                panic!("exploded");
            }
        })
        .await;
        assert_eq!(result, Err("exploded".to_string()));
    }

    #[tokio::test]
    async fn test_catch_task_panic_captures_formatted_message() {
        let n = 3;
        let result: Result<(), String> = catch_task_panic(async move {
            panic!("page {} exploded", n);
        })
        .await;
        assert_eq!(result, Err("page 3 exploded".to_string()));
    }

    #[test]
    fn test_fold_outcome() {
        let ok: Result<Result<u8, String>, String> = Ok(Ok(1));
        assert_eq!(fold_outcome("genres", ok), Ok(1));

        let failed: Result<Result<u8, String>, String> = Ok(Err("HTTP 500: boom".into()));
        assert_eq!(fold_outcome("genres", failed), Err("HTTP 500: boom".into()));

        let panicked: Result<Result<u8, String>, String> = Err("bad".into());
        assert_eq!(
            fold_outcome("load_more", panicked),
            Err("Internal error in load_more task: bad".into())
        );
    }
}
