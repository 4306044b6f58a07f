//! Build lifecycle: platform options, search-path shim and phase driver

mod driver;
mod options;
mod search_path;

pub use driver::{LifecycleDriver, Phase};
pub use options::{PlatformOptions, SearchPathSpec};
pub use search_path::{with_search_path, SearchPathGuard};
