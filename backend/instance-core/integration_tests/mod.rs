mod coordinator;
mod error;
mod helpers;
