use anyhow::{Context, Result};
use std::io::{BufRead, Write};

/// Prompt for username and password. The password is read without echo.
/// `default_username` is offered when re-logging in as the same user.
pub fn prompt_for_login(default_username: Option<&str>) -> Result<(String, String)> {
    let username = match default_username {
        Some(name) => print_and_read(&format!("Username [{}]: ", name))
            .map(|input| if input.is_empty() { name.to_string() } else { input })?,
        None => print_and_read("Username: ")?,
    };
    if username.is_empty() {
        anyhow::bail!("Username cannot be empty");
    }

    let password =
        rpassword::prompt_password("Password: ").context("Failed to read password from stdin")?;
    if password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }

    Ok((username, password))
}

fn print_and_read(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout().flush().context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}
