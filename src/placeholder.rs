//! Placeholder - an immutable named resolver
//!
//! A placeholder maps `(binding, token)` to a replacement string. The token is
//! passed whole (`coins_total`), so the resolver reads its own arguments.
//!
//! Resolvers are shared behind `Arc<dyn Resolve<T>>`; the two adapters below
//! let a placeholder written for one binding type serve another:
//! - [`Projected`]: borrow a capability out of the binding (`&Player -> &Entity`)
//! - [`Adapted`]: convert the binding into an owned value (`&Player -> Location`)

use std::fmt;
use std::sync::Arc;

use crate::error::ReplaceError;

/// Resolver seam. Implemented for every matching closure.
pub trait Resolve<T: ?Sized>: Send + Sync {
    fn resolve(&self, binding: &T, token: &str) -> Result<String, ReplaceError>;
}

impl<T, F> Resolve<T> for F
where
    T: ?Sized,
    F: Fn(&T, &str) -> Result<String, ReplaceError> + Send + Sync,
{
    #[inline]
    fn resolve(&self, binding: &T, token: &str) -> Result<String, ReplaceError> {
        self(binding, token)
    }
}

pub struct Placeholder<T: ?Sized> {
    identifier: Arc<str>,
    is_const: bool,
    resolver: Arc<dyn Resolve<T>>,
}

impl<T: ?Sized> Clone for Placeholder<T> {
    fn clone(&self) -> Self {
        Self {
            identifier: Arc::clone(&self.identifier),
            is_const: self.is_const,
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Placeholder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Placeholder")
            .field("identifier", &self.identifier)
            .field("is_const", &self.is_const)
            .finish_non_exhaustive()
    }
}

impl<T: ?Sized + 'static> Placeholder<T> {
    /// Infallible resolver, recomputed once its TTL window passes
    pub fn new<F>(identifier: impl Into<Arc<str>>, resolve: F) -> Self
    where
        F: Fn(&T, &str) -> String + Send + Sync + 'static,
    {
        Self::from_resolver(
            identifier,
            false,
            move |binding: &T, token: &str| -> Result<String, ReplaceError> {
                Ok(resolve(binding, token))
            },
        )
    }

    /// Resolver whose output never changes for a given token: computed once
    pub fn constant<F>(identifier: impl Into<Arc<str>>, resolve: F) -> Self
    where
        F: Fn(&T, &str) -> String + Send + Sync + 'static,
    {
        Self::new(identifier, resolve).into_const()
    }

    /// Resolver that may fail; failures are isolated to the token
    pub fn fallible<F, E>(identifier: impl Into<Arc<str>>, resolve: F) -> Self
    where
        F: Fn(&T, &str) -> Result<String, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        let identifier: Arc<str> = identifier.into();
        let id = Arc::clone(&identifier);
        Self::from_resolver(
            identifier,
            false,
            move |binding: &T, token: &str| -> Result<String, ReplaceError> {
                resolve(binding, token).map_err(|e| ReplaceError::resolve(&id, token, e))
            },
        )
    }

    pub fn from_resolver<R>(identifier: impl Into<Arc<str>>, is_const: bool, resolver: R) -> Self
    where
        R: Resolve<T> + 'static,
    {
        Self {
            identifier: identifier.into(),
            is_const,
            resolver: Arc::new(resolver),
        }
    }

    pub fn into_const(mut self) -> Self {
        self.is_const = true;
        self
    }

    /// Serve `A` bindings by borrowing a `T` out of them. Keeps `is_const`.
    pub fn project<A: ?Sized + 'static>(&self, project: fn(&A) -> &T) -> Placeholder<A> {
        Placeholder {
            identifier: Arc::clone(&self.identifier),
            is_const: self.is_const,
            resolver: Arc::new(Projected {
                project,
                inner: self.clone(),
            }),
        }
    }
}

impl<T: ?Sized> Placeholder<T> {
    #[inline]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    #[inline]
    pub fn is_const(&self) -> bool {
        self.is_const
    }

    #[inline]
    pub fn apply(&self, binding: &T, token: &str) -> Result<String, ReplaceError> {
        self.resolver.resolve(binding, token)
    }
}

impl<B: 'static> Placeholder<B> {
    /// Serve `A` bindings through an owned `A -> B` conversion.
    ///
    /// The result is never const: the conversion may yield a different `B`
    /// on every call even when `B`'s own resolver is stable.
    pub fn adapt<A: ?Sized + 'static>(
        &self,
        convert: Arc<dyn Fn(&A) -> B + Send + Sync>,
    ) -> Placeholder<A> {
        Placeholder {
            identifier: Arc::clone(&self.identifier),
            is_const: false,
            resolver: Arc::new(Adapted {
                convert,
                inner: self.clone(),
            }),
        }
    }
}

/// Capability adapter: `&A -> &T`, then delegate
pub struct Projected<A: ?Sized, T: ?Sized> {
    project: fn(&A) -> &T,
    inner: Placeholder<T>,
}

impl<A: ?Sized, T: ?Sized> Resolve<A> for Projected<A, T> {
    fn resolve(&self, binding: &A, token: &str) -> Result<String, ReplaceError> {
        self.inner.apply((self.project)(binding), token)
    }
}

/// Transform adapter: `&A -> B`, then delegate
pub struct Adapted<A: ?Sized, B> {
    convert: Arc<dyn Fn(&A) -> B + Send + Sync>,
    inner: Placeholder<B>,
}

impl<A: ?Sized, B> Resolve<A> for Adapted<A, B> {
    fn resolve(&self, binding: &A, token: &str) -> Result<String, ReplaceError> {
        let converted = (self.convert)(binding);
        self.inner.apply(&converted, token)
    }
}
