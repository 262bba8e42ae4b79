//! Text generation: backend selection, prompts, dispatch and output parsing

pub mod backend;
pub mod cloud;
pub mod dispatcher;
pub mod local;
pub mod prompts;
pub mod recommendations;

pub use backend::{select_backend, BackendKind, GenerationBackend};
pub use dispatcher::{GenerationDispatcher, GENERATION_UNAVAILABLE_PLACEHOLDER, NO_USABLE_RESPONSE};
