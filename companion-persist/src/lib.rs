pub mod events;

pub use events::{EventError, EventLog, JsonFileEventLog, MAX_EVENT_INPUT_CHARS, RunEvent};
