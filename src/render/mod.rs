mod core;

pub use core::AnsiRenderer;
pub(crate) use core::wrap_to_width;
