// Profile Manager: structured profile records, validation of the owner's
// form, and the one-per-user picture reference.

pub mod handlers;
pub mod manager;
pub mod models;
pub mod pictures;
