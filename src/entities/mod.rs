// Entity Models - records mirrored from the hosted relational store
//
// Each entity is a flat serde record:
// - Stable identity (UUID string) assigned locally, enforced remotely
// - Scalar fields only; uniqueness and referential integrity live in the
//   external database
// - Pure helper methods for the math the dashboards need

pub mod category;
pub mod transaction;
pub mod subscription;
pub mod savings_goal;
pub mod asset;

pub use category::{default_categories, Category, CategoryKind};
pub use transaction::{Transaction, TransactionKind};
pub use subscription::{total_monthly_cost, upcoming_renewals, BillingCadence, Subscription};
pub use savings_goal::SavingsGoal;
pub use asset::{Asset, DepreciationLine};
