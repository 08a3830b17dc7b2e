pub mod export;
pub mod group;
pub mod list;
pub mod rate;
pub mod status;
