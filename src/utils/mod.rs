pub mod accession;
pub mod command;
pub mod file;
pub mod streams;
pub mod system;
