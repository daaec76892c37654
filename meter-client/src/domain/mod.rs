mod block;
mod locale;
mod reading;
mod window;

pub use block::{BlockId, BlockIdError, BlockRule};
pub use locale::Locale;
pub use reading::{
    format_12_hour, format_date, format_time, parse_recorded_at, NewReading, Reading,
};
pub use window::{UnknownWindow, WindowKind};
