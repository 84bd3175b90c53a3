//! Lazy service container.
//!
//! [`App`] maps names to factories. [`App::get`] runs a factory the first time
//! a name is requested and memoizes what it produced; [`App::instantiate`]
//! runs the factory every time. Factories receive positional arguments as
//! [`serde_json::Value`]s and may produce nothing, in which case nothing is
//! memoized and the next `get` calls the factory again.
//!
//! # Examples
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use switchyard_core::services::App;
//!
//! let app = App::new();
//! app.service("greeting", |args| {
//!     let who = args.first().and_then(|v| v.as_str()).unwrap_or("world");
//!     Some(format!("hello {who}"))
//! });
//!
//! let first = app.get::<String>("greeting", &[]).unwrap().unwrap();
//! assert_eq!(first.as_str(), "hello world");
//!
//! // Memoized: arguments are ignored once a value is cached.
//! let again = app.get::<String>("greeting", &["ada".into()]).unwrap().unwrap();
//! assert!(std::sync::Arc::ptr_eq(&first, &again));
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::error::{SwitchyardError, SwitchyardResult};

/// A value produced by a service factory.
pub type ServiceValue = Arc<dyn Any + Send + Sync>;

/// A registered service factory.
pub type ServiceFactory = Arc<dyn Fn(&[Value]) -> Option<ServiceValue> + Send + Sync>;

/// A named-factory container with first-call memoization.
///
/// All methods take `&self`; the container is safe to share with handlers
/// while a dispatch is running.
#[derive(Default)]
pub struct App {
    factories: RwLock<HashMap<String, ServiceFactory>>,
    values: RwLock<HashMap<String, ServiceValue>>,
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let factories = self.factories.read().expect("service lock poisoned");
        let values = self.values.read().expect("service lock poisoned");
        let mut names: Vec<&String> = factories.keys().collect();
        names.sort();
        f.debug_struct("App")
            .field("services", &names)
            .field("memoized", &values.len())
            .finish()
    }
}

impl App {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under `name`.
    ///
    /// Registering a name twice replaces the factory and discards any value
    /// memoized from the previous one.
    pub fn service<T, F>(&self, name: impl Into<String>, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn(&[Value]) -> Option<T> + Send + Sync + 'static,
    {
        let wrapped: ServiceFactory =
            Arc::new(move |args| factory(args).map(|v| Arc::new(v) as ServiceValue));
        self.register_factory(name, wrapped);
    }

    /// Registers an already type-erased factory under `name`.
    pub fn register_factory(&self, name: impl Into<String>, factory: ServiceFactory) {
        let name = name.into();
        self.values
            .write()
            .expect("service lock poisoned")
            .remove(&name);
        tracing::debug!(service = %name, "registered service");
        self.factories
            .write()
            .expect("service lock poisoned")
            .insert(name, factory);
    }

    /// Returns `true` if a factory is registered under `name`.
    pub fn has(&self, name: &str) -> bool {
        self.factories
            .read()
            .expect("service lock poisoned")
            .contains_key(name)
    }

    /// Returns `true` if `name` currently has a memoized value.
    pub fn is_memoized(&self, name: &str) -> bool {
        self.values
            .read()
            .expect("service lock poisoned")
            .contains_key(name)
    }

    /// Returns the number of registered factories.
    pub fn len(&self) -> usize {
        self.factories.read().expect("service lock poisoned").len()
    }

    /// Returns `true` if no factory is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs the factory for `name` without consulting or filling the memo.
    ///
    /// # Errors
    ///
    /// [`SwitchyardError::UnknownService`] if no factory is registered.
    pub fn instantiate_value(&self, name: &str, args: &[Value]) -> SwitchyardResult<Option<ServiceValue>> {
        let factory = self
            .factories
            .read()
            .expect("service lock poisoned")
            .get(name)
            .cloned()
            .ok_or_else(|| SwitchyardError::UnknownService(name.to_string()))?;
        // The lock is released before the factory runs so factories may use the container.
        Ok(factory(args))
    }

    /// Returns the memoized value for `name`, running its factory on first use.
    ///
    /// A factory that produces nothing is not memoized.
    ///
    /// # Errors
    ///
    /// [`SwitchyardError::UnknownService`] if no factory is registered.
    pub fn get_value(&self, name: &str, args: &[Value]) -> SwitchyardResult<Option<ServiceValue>> {
        if let Some(value) = self
            .values
            .read()
            .expect("service lock poisoned")
            .get(name)
        {
            return Ok(Some(Arc::clone(value)));
        }

        let Some(value) = self.instantiate_value(name, args)? else {
            return Ok(None);
        };

        let mut values = self.values.write().expect("service lock poisoned");
        let stored = values.entry(name.to_string()).or_insert(value);
        Ok(Some(Arc::clone(stored)))
    }

    /// Typed variant of [`get_value`](Self::get_value).
    ///
    /// # Errors
    ///
    /// [`SwitchyardError::UnknownService`] if no factory is registered, or
    /// [`SwitchyardError::ServiceTypeMismatch`] if the value is not a `T`.
    pub fn get<T: Any + Send + Sync>(&self, name: &str, args: &[Value]) -> SwitchyardResult<Option<Arc<T>>> {
        self.get_value(name, args)?
            .map(|value| downcast(name, value))
            .transpose()
    }

    /// Typed variant of [`instantiate_value`](Self::instantiate_value).
    ///
    /// # Errors
    ///
    /// [`SwitchyardError::UnknownService`] if no factory is registered, or
    /// [`SwitchyardError::ServiceTypeMismatch`] if the value is not a `T`.
    pub fn instantiate<T: Any + Send + Sync>(
        &self,
        name: &str,
        args: &[Value],
    ) -> SwitchyardResult<Option<Arc<T>>> {
        self.instantiate_value(name, args)?
            .map(|value| downcast(name, value))
            .transpose()
    }

    /// Drops the memoized value for `name`, if any.
    pub fn forget(&self, name: &str) -> bool {
        self.values
            .write()
            .expect("service lock poisoned")
            .remove(name)
            .is_some()
    }
}

fn downcast<T: Any + Send + Sync>(name: &str, value: ServiceValue) -> SwitchyardResult<Arc<T>> {
    value
        .downcast::<T>()
        .map_err(|_| SwitchyardError::ServiceTypeMismatch(name.to_string()))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn test_get_returns_factory_value() {
        let app = App::new();
        app.service("foo", |_| Some("yay".to_string()));
        let value = app.get::<String>("foo", &[]).unwrap().unwrap();
        assert_eq!(value.as_str(), "yay");
    }

    #[test]
    fn test_get_unknown_service() {
        let app = App::new();
        let err = app.get::<String>("random_thing_that_doesnt_exist", &[]).unwrap_err();
        assert!(matches!(err, SwitchyardError::UnknownService(name) if name == "random_thing_that_doesnt_exist"));
        assert!(matches!(
            app.instantiate::<String>("nope", &[]),
            Err(SwitchyardError::UnknownService(_))
        ));
    }

    #[test]
    fn test_get_is_memoized() {
        let app = App::new();
        app.service("obj", |_| Some(Mutex::new(Vec::<u8>::new())));
        let a = app.get::<Mutex<Vec<u8>>>("obj", &[]).unwrap().unwrap();
        let b = app.get::<Mutex<Vec<u8>>>("obj", &[]).unwrap().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(app.is_memoized("obj"));
    }

    #[test]
    fn test_none_is_not_memoized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let app = App::new();
        app.service::<(), _>("side_effect", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            None
        });

        assert!(app.get::<()>("side_effect", &[]).unwrap().is_none());
        assert!(app.get::<()>("side_effect", &[]).unwrap().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!app.is_memoized("side_effect"));
    }

    #[test]
    fn test_instantiate_is_not_memoized() {
        let app = App::new();
        app.service("fresh", |_| Some(Mutex::new(0_u32)));
        let a = app.instantiate::<Mutex<u32>>("fresh", &[]).unwrap().unwrap();
        let b = app.instantiate::<Mutex<u32>>("fresh", &[]).unwrap().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(!app.is_memoized("fresh"));
    }

    #[test]
    fn test_factory_receives_args() {
        let app = App::new();
        app.service("sum", |args| {
            Some(args.iter().filter_map(Value::as_i64).sum::<i64>())
        });
        let total = app
            .instantiate::<i64>("sum", &[Value::from(2), Value::from(40)])
            .unwrap()
            .unwrap();
        assert_eq!(*total, 42);
    }

    #[test]
    fn test_reregister_replaces_and_forgets() {
        let app = App::new();
        app.service("foo", |_| Some("foo".to_string()));
        assert_eq!(app.get::<String>("foo", &[]).unwrap().unwrap().as_str(), "foo");

        app.service("foo", |_| Some("foo2".to_string()));
        assert_eq!(app.get::<String>("foo", &[]).unwrap().unwrap().as_str(), "foo2");
        assert_eq!(app.len(), 1);
    }

    #[test]
    fn test_type_mismatch() {
        let app = App::new();
        app.service("num", |_| Some(7_u8));
        assert!(matches!(
            app.get::<String>("num", &[]),
            Err(SwitchyardError::ServiceTypeMismatch(_))
        ));
    }

    #[test]
    fn test_forget_and_has() {
        let app = App::new();
        assert!(app.is_empty());
        app.service("x", |_| Some(1_i32));
        assert!(app.has("x"));
        assert!(!app.has("y"));
        app.get::<i32>("x", &[]).unwrap();
        assert!(app.forget("x"));
        assert!(!app.forget("x"));
    }
}
