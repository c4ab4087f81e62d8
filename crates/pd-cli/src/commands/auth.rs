//! `unlock`, `status` and `lock` against a running host

use anyhow::Result;

use crate::client::DeskClient;
use crate::output::{format_status, format_unlock, print_success};

pub async fn unlock(
    server: &str,
    password: &str,
    client_id: Option<&str>,
    quiet: bool,
) -> Result<()> {
    let response = DeskClient::new(server).unlock(password, client_id).await?;
    if quiet {
        println!("{}", response.token);
    } else {
        print_success("Unlocked");
        print!("{}", format_unlock(&response));
    }
    Ok(())
}

pub async fn status(server: &str, token: &str) -> Result<()> {
    let response = DeskClient::new(server).status(token).await?;
    print!("{}", format_status(&response));
    Ok(())
}

pub async fn lock(server: &str, token: &str, quiet: bool) -> Result<()> {
    let receipt = DeskClient::new(server).lock(token).await?;
    if !quiet {
        print_success(&format!("Session locked at {}", receipt.locked_at));
    }
    Ok(())
}
