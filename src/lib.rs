pub mod application;
pub mod commands;
pub mod config;
pub mod error;
pub mod package;
pub mod repository;
pub mod runtime;
pub mod tools;
