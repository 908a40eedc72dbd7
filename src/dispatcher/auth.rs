//! Permission checks against the invoking source.

/// Decides whether a source holds a permission.
pub trait CommandAuthorizer<S>: Send + Sync {
    fn authorize(&self, permission: &str, source: &S) -> bool;
}

impl<S, F> CommandAuthorizer<S> for F
where
    F: Fn(&str, &S) -> bool + Send + Sync,
{
    fn authorize(&self, permission: &str, source: &S) -> bool {
        self(permission, source)
    }
}

/// Grants every permission.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl<S> CommandAuthorizer<S> for AllowAll {
    fn authorize(&self, _permission: &str, _source: &S) -> bool {
        true
    }
}
