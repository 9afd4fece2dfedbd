pub mod event_forward;
