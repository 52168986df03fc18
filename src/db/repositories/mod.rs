pub mod application_repository;
pub mod suggestion_repository;
pub mod vote_repository;

pub use application_repository::*;
pub use suggestion_repository::*;
pub use vote_repository::*;
