pub mod game;
pub mod knowledge;
pub mod model;

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "azen"
    }

    pub const fn codename() -> &'static str {
        "Shedding Engine"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
