mod config;
mod coordinator;
