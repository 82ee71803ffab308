pub mod config;
pub mod permissions;
pub mod recording;
pub mod widget;

pub use config::*;
pub use permissions::*;
pub use recording::*;
pub use widget::*;
