#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod enrich;
pub mod extract;
pub mod fetch;
pub mod formats;
pub mod gemini;
pub mod harvest;
pub mod logging;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod run;
