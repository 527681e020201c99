pub(crate) mod account;
pub(crate) mod admin;
pub(crate) mod cart;
pub(crate) mod catalog;
pub(crate) mod public;
pub(crate) mod request_tracing;
