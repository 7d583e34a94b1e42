// Accounts: credential hashing and signup policy, the per-user session state
// machine, and the token registry the HTTP layer uses to find a session.

pub mod credentials;
pub mod handlers;
pub mod registry;
pub mod session;
