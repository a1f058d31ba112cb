use rand::{CryptoRng, Rng, RngCore};

pub const GIFT_CODE_LEN: usize = 16;
pub const ACCESS_TOKEN_LEN: usize = 32;
pub const SALT_LEN: usize = 32;

const GIFT_CODE_CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const ACCESS_TOKEN_CHARSET: &[u8] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn random_string<R: Rng + ?Sized>(rng: &mut R, charset: &[u8], len: usize) -> String {
    (0..len)
        .map(|_| charset[rng.gen_range(0..charset.len())] as char)
        .collect()
}

/// Upper-case alphanumeric code handed out to customers.
pub fn random_gift_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    random_string(rng, GIFT_CODE_CHARSET, GIFT_CODE_LEN)
}

pub fn random_access_token<R: Rng + ?Sized>(rng: &mut R) -> String {
    random_string(rng, ACCESS_TOKEN_CHARSET, ACCESS_TOKEN_LEN)
}

pub fn random_salt<R: RngCore + CryptoRng + ?Sized>(rng: &mut R) -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rng.fill_bytes(&mut salt);
    salt
}
