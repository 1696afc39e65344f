//! Test harness for treesync clients.
//!
//! A scripted remote authority, a simulated browser history platform and a
//! scenario framework, so client behavior can be exercised end to end
//! without a real server or host.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod authority;
pub mod host;
pub mod logging;
pub mod platform;
pub mod scenario;

pub use authority::SimAuthority;
pub use host::SimHost;
pub use platform::SimPlatform;
