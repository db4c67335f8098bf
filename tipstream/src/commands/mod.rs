// Copyright (c) 2025 Tipstream Contributors

pub mod init;
pub mod payout;
pub mod run;
pub mod status;
pub mod verify_chain;
