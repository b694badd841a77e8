pub mod worker;

pub use worker::{channel, Dispatcher, Executor, TaskHandle};
