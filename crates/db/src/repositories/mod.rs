//! Repository implementations of the core persistence traits.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod alert;
pub mod exchange_rate;
pub mod loan;
mod mapping;

pub use alert::AlertRepository;
pub use exchange_rate::ExchangeRateRepository;
pub use loan::LoanRepository;
