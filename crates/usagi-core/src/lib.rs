//! Core library for usagi: instruction-document parsing and the
//! plan / patch / apply / check pipeline.
//!
//! The CLI crate wires these pieces to the console and the config file;
//! everything here is usable headless (see [`ui::NullUi`]).

pub mod llm;
pub mod pipeline;
pub mod report;
pub mod spec;
pub mod ui;
pub mod vcs;
