pub mod initialization;
pub mod optimization;
pub mod storage;
