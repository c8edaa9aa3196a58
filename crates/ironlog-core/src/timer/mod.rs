mod rest;

pub use rest::{validate_duration, RestTimer, TimerState, MAX_REST_SECS};
