//! Model downloading and loading for the background-removal stage.

mod loader;

pub use loader::{ModelCache, ModelType};
