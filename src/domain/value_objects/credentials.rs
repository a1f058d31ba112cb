use anyhow::{Result, bail};

pub const USERNAME_MIN_LEN: usize = 2;
pub const USERNAME_MAX_LEN: usize = 32;
pub const MAX_EMAIL_LEN: usize = 256;
pub const MAX_PASSWORD_LEN: usize = 255;

pub fn validate_username(username: &str) -> Result<()> {
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        bail!("Invalid username: must be {USERNAME_MIN_LEN} to {USERNAME_MAX_LEN} characters");
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        bail!("Invalid username: only letters, digits, '_' and '-' are allowed");
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<()> {
    if email.chars().count() > MAX_EMAIL_LEN {
        bail!("Invalid e-mail: too long");
    }
    if email.contains(['\n', '\r']) {
        bail!("Invalid e-mail: contains line breaks");
    }
    match email.rsplit_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => bail!("Invalid e-mail: expected something@somewhere"),
    }
}

pub fn validate_password(password: &str) -> Result<()> {
    let len = password.chars().count();
    if len == 0 {
        bail!("Invalid password: empty");
    }
    if len > MAX_PASSWORD_LEN {
        bail!("Invalid password: too long");
    }
    Ok(())
}
