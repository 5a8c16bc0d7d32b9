mod cli;
mod common;
mod pipeline;
mod transport;
