pub mod accounts;
pub mod gift_codes;
pub mod orders;
pub mod password_reset_tokens;
pub mod vpn_sessions;
