pub mod jsonl;
pub mod progress;
pub mod text;

pub use jsonl::JsonlRendererPlugin;
pub use progress::ProgressRendererPlugin;
pub use text::TextRendererPlugin;
