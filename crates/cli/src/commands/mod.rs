//! Command implementations.

mod run;
mod validate;

pub use run::run_router;
pub use validate::run_validate;
