// Life of a request:
// 1. The router picks a handler
// 2. Extractors run; `RequiredAuth` / `OptionalAuth` verify the
//    `Authorization: Token <jwt>` header and reject with 401 before the handler
//    body runs
// 3. The handler receives the decoded claims as a plain argument
// 4. Credential work (hashing, verification) runs on the blocking pool
// 5. Responses that identify a user carry a freshly issued token
//
// System components:
//  - Credential manager (PBKDF2 salted hashes)
//  - Token authenticator (HS256 session tokens, two enforcement modes)
//  - User store

pub mod auth;
pub mod config;
pub mod routes;
pub mod state;
pub mod users;

mod e2e_tests;

pub use state::AppState;
