pub mod color;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod fetch;
pub mod hierarchy;
pub mod human;
pub mod legend;
pub mod loader;
pub mod model;
pub mod session;
pub mod stability;
pub mod treemap;

pub use error::*;
pub use hierarchy::build;
pub use model::*;
pub use treemap::{layout, LayoutOptions, Rect, TilingMode};
