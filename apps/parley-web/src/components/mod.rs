pub mod alert;
pub mod spinner;

pub use alert::{Alert, AlertVariant};
pub use spinner::{Spinner, SpinnerSize};
