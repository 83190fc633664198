// gam: command-line administration of a hosted groupware domain
// Exposes the transport, API clients and command handlers as a library

pub mod api;
pub mod args;
pub mod cli;
pub mod command;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod error;
pub mod http;
pub mod oauth;
pub mod output;
pub mod rate_limit;
pub mod retry;
pub mod sanitize;
pub mod targets;
pub mod validation;
pub mod xml;
