use crate::error::LocateResult;
use std::future::Future;
use tokio::sync::OnceCell;

/// Value held by `cell`, running `load` only while the cell is empty. A failed
/// load leaves the cell empty, so the next call tries again.
pub async fn load_once<'a, T, F, Fut>(cell: &'a OnceCell<T>, name: &str, load: F) -> LocateResult<&'a T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = LocateResult<T>>,
{
    if let Some(value) = cell.get() {
        tracing::debug!("Reusing cached {}", name);
        return Ok(value);
    }

    cell.get_or_try_init(load).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LocateError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn loads_once_then_reuses() {
        let cell = OnceCell::new();
        let calls = AtomicUsize::new(0);
        let calls = &calls;
        let load = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, LocateError>(vec![1, 2, 3])
        };

        let first = load_once(&cell, "numbers", load).await.unwrap();
        let second = load_once(&cell, "numbers", load).await.unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_load_is_retried() {
        let cell: OnceCell<usize> = OnceCell::new();
        let failed = load_once(&cell, "numbers", || async {
            Err::<usize, _>(LocateError::unavailable("numbers", "offline"))
        })
        .await;
        assert!(matches!(failed, Err(LocateError::DirectoryUnavailable { .. })));
        assert!(cell.get().is_none());

        let value = load_once(&cell, "numbers", || async { Ok::<_, LocateError>(7) }).await.unwrap();
        assert_eq!(*value, 7);
    }
}
