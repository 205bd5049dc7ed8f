#![deny(warnings)]
pub mod eval;
pub mod model;
pub mod scoring;
pub mod snapshot;
pub mod state;

pub struct CoreInfo;

impl CoreInfo {
    pub const fn name() -> &'static str {
        "ofc-core"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
