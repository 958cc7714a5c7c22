pub mod allowance_repository;
pub mod db;
pub mod payment_attempt_repository;

pub use allowance_repository::AllowanceRepository;
pub use db::DbConnection;
pub use payment_attempt_repository::PaymentAttemptRepository;
