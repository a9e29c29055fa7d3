pub mod config;
pub mod control;
pub mod enforce;
pub mod error;
pub mod intercept;
pub mod page;
pub mod store;
pub mod switcher;
pub mod tiles;
pub mod watcher;

pub use config::SwitcherConfig;
pub use control::{ControlConfig, ControlOptions, LibraryConstants, LiveControlOptions, LiveControls};
pub use enforce::{LoopId, LoopRegistry, TickOutcome};
pub use error::SwitcherError;
pub use intercept::{LoadInterceptor, LoadOutcome};
pub use page::{PathSource, is_enforced_page};
pub use store::{MemoryStore, SettingStore};
pub use switcher::{InstanceState, MapHandle, MapOptions, SwitchedMap, Switcher};
pub use tiles::{CUSTOM_LAYERS, TileLayerSpec};
pub use watcher::{ScriptWatcher, WatchState};
