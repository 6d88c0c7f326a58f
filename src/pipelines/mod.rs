pub mod check_availability;
pub mod check_downloads;
pub mod download;
