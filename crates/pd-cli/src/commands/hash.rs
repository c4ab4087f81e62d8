//! `hash-password`: produce the digest stored in `auth.password_sha256`

use std::io::Read;

use anyhow::{bail, Context, Result};
use pd_core::token::password_digest;

/// Print the digest of `password`, or of stdin when none is given
pub fn run(password: Option<String>) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read password from stdin")?;
            buf.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    if password.is_empty() {
        bail!("Password must not be empty");
    }

    println!("{}", password_digest(&password));
    Ok(())
}
