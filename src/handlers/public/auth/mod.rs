// handlers/public/auth/mod.rs - Token acquisition endpoints (no authentication)

pub mod login; // POST /api/auth/login - verify credentials, issue token
pub mod register; // POST /api/auth/register - create an account

pub use login::login;
pub use register::register;
