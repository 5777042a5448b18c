pub mod masterfile;
pub mod series;
pub mod tsv;

pub use masterfile::{rotate, MasterTable};
pub use series::write_stimulus_series;
pub use tsv::{load_records, save_records};
