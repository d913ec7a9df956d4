pub mod audit;
pub mod extraction;
pub mod registry;
pub mod trace;
pub mod writer;
