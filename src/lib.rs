//! Install, control and supervise a program as a host init system service.
//!
//! ```no_run
//! use initsvc::init::InitKind;
//! use initsvc::service::ServiceDescription;
//!
//! let desc = ServiceDescription::new("webhook")
//!     .display_name("Webhook relay")
//!     .executable("/usr/local/bin/webhook")
//!     .arguments(["--port", "8080"])
//!     .user_name("relay");
//!
//! if let Some(kind) = InitKind::detect() {
//!     let service = kind.create(desc);
//!     service.install()?;
//!     service.start()?;
//! }
//! # Ok::<(), initsvc::ServiceError>(())
//! ```

pub mod cmd;
pub mod error;
pub mod init;
pub mod logger;
pub mod paths;
pub mod service;
pub mod supervisor;

pub use error::{Result, ServiceError};
pub use init::{InitKind, InitSystem, ServiceStatus};
pub use logger::Logger;
pub use service::ServiceDescription;
pub use supervisor::{ChildProgram, Program};
