pub mod model;
pub mod repository;

pub use model::{ContributionTransactionDB, LoanTransactionDB, SavingsTransactionDB};
pub use repository::LedgerRepository;
