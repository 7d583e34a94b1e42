// History Ledger: append-only per-user log of advisory exchanges.

pub mod handlers;
pub mod ledger;
