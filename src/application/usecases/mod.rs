pub mod accounts;
pub mod entitlements;
pub mod vpn_sessions;
