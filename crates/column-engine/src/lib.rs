pub mod api;
pub mod core;
pub mod error;
pub mod input;
pub mod session;
pub mod systems;
pub mod trigger;

// Re-export key types at crate root for convenience
pub use api::config::{ProfileTuning, SessionConfig, ViewportProfile};
pub use api::page::{Page, PageAssets};
pub use api::types::{
    Command, ConfirmSpec, Layout, PopupBody, PopupHandle, PopupKind, Viewport,
};
pub use core::clock::{FixedTimestep, TaskId, TaskQueue};
pub use core::context::{SessionContext, Task};
pub use error::PopupError;
pub use input::queue::{InputEvent, InputQueue, KEY_ESCAPE, KEY_RESET};
pub use session::Session;
pub use systems::lifecycle::{ActivePopup, Phase};
pub use systems::scheduler::{PopupHost, PopupScheduler, SchedulerState};
pub use trigger::descriptor::TriggerDescriptor;
pub use trigger::registry::TriggerRegistry;
