pub mod contract;
pub mod niche;
