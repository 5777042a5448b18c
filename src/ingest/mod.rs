pub mod labjs;

pub use labjs::{load_export, parse_export};
