//! Browser automation module
//!
//! One isolated Chromium session per account, driven over CDP. The
//! `LoginAutomation`/`LoginSession` traits cover exactly the surface the
//! login flow needs, so the flow can also run against a mock collaborator.

mod errors;
mod login;
pub mod mock;
mod session;

pub use errors::BrowserError;
pub use login::{LoginDriver, LoginOutcome};
pub use session::{ChromiumAutomation, LoginAutomation, LoginSession, SessionConfig};
