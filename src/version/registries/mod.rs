//! Plugin source implementations

pub mod update_center;

pub use update_center::UpdateCenter;
