pub mod args;

pub use args::{Arguments, Compressor};

use clap::Parser;

pub fn parse() -> Arguments {
    Arguments::parse()
}
