#[cfg(unix)]
pub mod capture;
pub mod source;
#[cfg(all(unix, feature = "spim"))]
pub mod spim;
pub mod spim_text;
pub mod staging;
pub mod terminal;
