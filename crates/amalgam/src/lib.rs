pub mod app;
pub mod domain;
pub mod infra;

pub fn init(verbosity: u8) {
    infra::logging::init(verbosity);
}
