/// The deploy REST service.
pub(crate) mod service;
