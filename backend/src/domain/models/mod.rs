pub mod allowance;
pub mod payment_attempt;

pub use allowance::{Allowance, Currency};
pub use payment_attempt::{AttemptStatus, PaymentAttempt};
