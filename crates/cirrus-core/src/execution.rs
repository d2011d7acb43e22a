//! Per-invocation execution context.
//!
//! The [`ExecutionContext`] is a string-keyed store that lives exactly as
//! long as one invocation. It is bound to the task running the invocation
//! with [`tokio::task_local!`], so two invocations interleaved on the same
//! runtime never observe each other's values, even across `.await` points.
//!
//! Accessors called outside [`ExecutionContext::run_scoped`] fail with
//! [`ContextError::NoActiveScope`]. Tasks spawned from inside a scope do not
//! inherit it.
//!
//! # Example
//!
//! ```
//! use cirrus_core::ExecutionContext;
//!
//! # tokio_test::block_on(async {
//! let seen = ExecutionContext::run_scoped(async {
//!     ExecutionContext::set("tenant", "acme".to_string())?;
//!     ExecutionContext::get::<String>("tenant")
//! })
//! .await
//! .unwrap();
//!
//! assert_eq!(seen.as_deref(), Some("acme"));
//! assert!(!ExecutionContext::is_active());
//! # });
//! ```

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

/// A value held in the execution context.
pub type ContextValue = Arc<dyn Any + Send + Sync>;

type Store = HashMap<String, ContextValue>;

tokio::task_local! {
    static STORE: RefCell<Store>;
}

/// Errors raised by [`ExecutionContext`] accessors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The accessor ran outside any invocation scope.
    #[error("execution context accessed outside of an invocation scope")]
    NoActiveScope,

    /// The stored value has a different type than requested.
    #[error("execution context value '{key}' has an unexpected type")]
    TypeMismatch {
        /// The key that was read.
        key: String,
    },

    /// A value required by the caller is absent.
    #[error("execution context value '{key}' is not set")]
    MissingValue {
        /// The key that was read.
        key: String,
    },
}

/// Initial values for a scope, mostly used by tests.
///
/// ```
/// use cirrus_core::{ContextSeed, ExecutionContext};
///
/// # tokio_test::block_on(async {
/// let seed = ContextSeed::new().with("userId", 42_u64);
/// let value = ExecutionContext::run_scoped_with(seed, async {
///     ExecutionContext::get::<u64>("userId")
/// })
/// .await;
/// assert_eq!(value, Ok(Some(42)));
/// # });
/// ```
#[derive(Default, Clone)]
pub struct ContextSeed {
    values: Store,
}

impl ContextSeed {
    /// Creates an empty seed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value.
    #[must_use]
    pub fn with<T>(mut self, key: impl Into<String>, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        self.values.insert(key.into(), Arc::new(value));
        self
    }

    /// Number of seeded values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing is seeded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Debug for ContextSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextSeed")
            .field("keys", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Accessors for the store bound to the current invocation.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionContext;

impl ExecutionContext {
    /// Runs `future` inside a fresh, empty store.
    pub async fn run_scoped<F>(future: F) -> F::Output
    where
        F: Future,
    {
        STORE.scope(RefCell::new(Store::new()), future).await
    }

    /// Runs `future` inside a store pre-populated from `seed`.
    pub async fn run_scoped_with<F>(seed: ContextSeed, future: F) -> F::Output
    where
        F: Future,
    {
        STORE.scope(RefCell::new(seed.values), future).await
    }

    /// Returns true when called inside an invocation scope.
    #[must_use]
    pub fn is_active() -> bool {
        STORE.try_with(|_| ()).is_ok()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set<T>(key: impl Into<String>, value: T) -> Result<(), ContextError>
    where
        T: Any + Send + Sync,
    {
        let key = key.into();
        STORE
            .try_with(|store| {
                store.borrow_mut().insert(key, Arc::new(value));
            })
            .map_err(|_| ContextError::NoActiveScope)
    }

    /// Returns a clone of the value under `key`, or `None` when unset.
    pub fn get<T>(key: &str) -> Result<Option<T>, ContextError>
    where
        T: Any + Clone,
    {
        let value = Self::raw(key)?;
        match value {
            None => Ok(None),
            Some(value) => value
                .downcast_ref::<T>()
                .cloned()
                .map(Some)
                .ok_or_else(|| ContextError::TypeMismatch {
                    key: key.to_string(),
                }),
        }
    }

    /// Like [`ExecutionContext::get`], failing with
    /// [`ContextError::MissingValue`] when unset.
    pub fn require<T>(key: &str) -> Result<T, ContextError>
    where
        T: Any + Clone,
    {
        Self::get(key)?.ok_or_else(|| ContextError::MissingValue {
            key: key.to_string(),
        })
    }

    /// Replaces the value under `key` with `f(current)`.
    ///
    /// `f` runs without holding the store, so it may read the context.
    pub fn update<T, F>(key: &str, f: F) -> Result<(), ContextError>
    where
        T: Any + Clone + Send + Sync,
        F: FnOnce(Option<T>) -> T,
    {
        let current = Self::get::<T>(key)?;
        let next = f(current);
        Self::set(key, next)
    }

    /// Removes the value under `key`, returning whether it was present.
    pub fn remove(key: &str) -> Result<bool, ContextError> {
        STORE
            .try_with(|store| store.borrow_mut().remove(key).is_some())
            .map_err(|_| ContextError::NoActiveScope)
    }

    /// Returns true when `key` holds a value.
    pub fn contains(key: &str) -> Result<bool, ContextError> {
        Ok(Self::raw(key)?.is_some())
    }

    fn raw(key: &str) -> Result<Option<ContextValue>, ContextError> {
        STORE
            .try_with(|store| store.borrow().get(key).cloned())
            .map_err(|_| ContextError::NoActiveScope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_set_and_get_inside_scope() {
        let result = ExecutionContext::run_scoped(async {
            ExecutionContext::set("count", 3_u32).unwrap();
            ExecutionContext::get::<u32>("count").unwrap()
        })
        .await;

        assert_eq!(result, Some(3));
    }

    #[tokio::test]
    async fn test_access_outside_scope_fails() {
        assert!(!ExecutionContext::is_active());
        assert_eq!(
            ExecutionContext::set("k", 1_u8),
            Err(ContextError::NoActiveScope)
        );
        assert_eq!(
            ExecutionContext::get::<u8>("k"),
            Err(ContextError::NoActiveScope)
        );
    }

    #[tokio::test]
    async fn test_type_mismatch() {
        let result = ExecutionContext::run_scoped(async {
            ExecutionContext::set("k", "text".to_string()).unwrap();
            ExecutionContext::get::<u32>("k")
        })
        .await;

        assert!(matches!(result, Err(ContextError::TypeMismatch { .. })));
    }

    #[tokio::test]
    async fn test_update_can_read_context() {
        let result = ExecutionContext::run_scoped(async {
            ExecutionContext::set("base", 10_i64).unwrap();
            ExecutionContext::update::<i64, _>("total", |current| {
                let base = ExecutionContext::get::<i64>("base").unwrap().unwrap_or(0);
                current.unwrap_or(0) + base
            })
            .unwrap();
            ExecutionContext::get::<i64>("total").unwrap()
        })
        .await;

        assert_eq!(result, Some(10));
    }

    #[tokio::test]
    async fn test_remove_and_contains() {
        ExecutionContext::run_scoped(async {
            ExecutionContext::set("k", 1_u8).unwrap();
            assert!(ExecutionContext::contains("k").unwrap());
            assert!(ExecutionContext::remove("k").unwrap());
            assert!(!ExecutionContext::contains("k").unwrap());
            assert!(!ExecutionContext::remove("k").unwrap());
        })
        .await;
    }

    #[tokio::test]
    async fn test_require_missing_value() {
        let result =
            ExecutionContext::run_scoped(async { ExecutionContext::require::<String>("nope") })
                .await;
        assert_eq!(
            result,
            Err(ContextError::MissingValue {
                key: "nope".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_seeded_scope() {
        let seed = ContextSeed::new().with("a", 1_u8).with("b", "two".to_string());
        assert_eq!(seed.len(), 2);

        let (a, b) = ExecutionContext::run_scoped_with(seed, async {
            (
                ExecutionContext::get::<u8>("a").unwrap(),
                ExecutionContext::get::<String>("b").unwrap(),
            )
        })
        .await;

        assert_eq!(a, Some(1));
        assert_eq!(b.as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_nested_scope_shadows_outer() {
        ExecutionContext::run_scoped(async {
            ExecutionContext::set("k", 1_u8).unwrap();
            ExecutionContext::run_scoped(async {
                assert_eq!(ExecutionContext::get::<u8>("k").unwrap(), None);
                ExecutionContext::set("k", 2_u8).unwrap();
            })
            .await;
            assert_eq!(ExecutionContext::get::<u8>("k").unwrap(), Some(1));
        })
        .await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_scopes_do_not_share_values() {
        async fn invocation(id: u32, delay: u64) -> (u32, u32) {
            ExecutionContext::run_scoped(async move {
                ExecutionContext::set("userId", id).unwrap();
                tokio::time::sleep(Duration::from_millis(delay)).await;
                ExecutionContext::set("step", id * 10).unwrap();
                tokio::time::sleep(Duration::from_millis(delay)).await;
                (
                    ExecutionContext::get::<u32>("userId").unwrap().unwrap(),
                    ExecutionContext::get::<u32>("step").unwrap().unwrap(),
                )
            })
            .await
        }

        let (first, second) = tokio::join!(invocation(1, 20), invocation(2, 5));
        assert_eq!(first, (1, 10));
        assert_eq!(second, (2, 20));
    }

    #[tokio::test]
    async fn test_spawned_task_does_not_inherit_scope() {
        let inherited = ExecutionContext::run_scoped(async {
            ExecutionContext::set("k", 1_u8).unwrap();
            tokio::spawn(async { ExecutionContext::is_active() })
                .await
                .unwrap()
        })
        .await;

        assert!(!inherited);
    }
}
