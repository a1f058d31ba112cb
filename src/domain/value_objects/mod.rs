pub mod credentials;
pub mod entitlements;
pub mod enums;
pub mod passwords;
pub mod random_codes;
