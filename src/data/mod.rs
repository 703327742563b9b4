mod load;
mod model;
mod outlines;

pub use load::{check_invariants, load_dataset, parse_dataset, DatasetError};
pub use model::{BasicInfo, CategoryBlock, CountryRecord, Dataset, Level, Unit, RESERVED_KEYS};
pub use outlines::{generate_simple_outline, load_outlines};
