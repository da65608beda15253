//! Authentication state traits and macro.

use super::extractors::Authenticator;

/// Trait for state types that can authenticate end users.
pub trait HasAuthBackend {
    fn authenticator(&self) -> &Authenticator;
}

/// Trait for state types that accept calls from the payment provider.
pub trait HasServiceKey {
    fn service_key(&self) -> &str;
}

/// Macro to implement `HasAuthBackend` for state structs with the standard field.
///
/// The struct must have an `auth: Authenticator` field.
///
/// # Example
/// ```ignore
/// use crate::impl_has_auth_backend;
///
/// #[derive(Clone)]
/// pub struct MyState {
///     pub db: Database,
///     pub auth: Authenticator,
/// }
///
/// impl_has_auth_backend!(MyState);
/// ```
#[macro_export]
macro_rules! impl_has_auth_backend {
    ($state_type:ty) => {
        impl $crate::auth::HasAuthBackend for $state_type {
            fn authenticator(&self) -> &$crate::auth::Authenticator {
                &self.auth
            }
        }
    };
}
