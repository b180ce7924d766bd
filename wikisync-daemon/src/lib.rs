//! Long-running mode: follow the registry change stream and run a debounced
//! full sync after each quiet period.

mod error;
pub mod runtime;
pub mod stream;

pub use error::DaemonError;
pub use runtime::{
    init_tracing, run, start_blocking, LogFormat, Orchestrator, PassRunner, DEBOUNCE_WINDOW,
};
pub use stream::{
    run_change_stream, Backoff, ChangeEvent, ChangeKind, ChangeStreamSource, SseDecoder, SseFrame,
};
