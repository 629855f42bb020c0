pub mod adapters;
pub mod renderers;
pub mod strategies;

pub use adapters::{JavaExecutor, NodeExecutor, PythonExecutor};
pub use renderers::{JsonlRendererPlugin, ProgressRendererPlugin, TextRendererPlugin};
pub use strategies::LinearRetryPlugin;
