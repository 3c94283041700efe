/// Constants shared across the service.
pub(crate) mod constants;
/// Error module.
pub(crate) mod error;
