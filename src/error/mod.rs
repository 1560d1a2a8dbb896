mod types;

pub use types::{PageError, Result};
