//! Status, identity and registration.

use netgate_api::NetgateClient;
use netgate_core::UserInfo;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub async fn status(client: &NetgateClient, global: &GlobalOpts) -> Result<(), CliError> {
    let resp = client.root().await?;
    output::print_output(
        &format!("{}: {}", client.base_url(), resp.message),
        global.quiet,
    );
    Ok(())
}

pub async fn whoami(client: &NetgateClient, global: &GlobalOpts) -> Result<(), CliError> {
    let me = client.me().await?;
    let out = output::render_single(
        &global.output,
        &me,
        |u: &UserInfo| format!("{} ({})", u.username, u.role),
        |u| u.username.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn register(
    client: &NetgateClient,
    username: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let password = match &global.password {
        Some(p) => p.clone(),
        None => {
            let first = rpassword::prompt_password("New password: ")?;
            let second = rpassword::prompt_password("Repeat password: ")?;
            if first != second {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "passwords do not match".into(),
                });
            }
            first
        }
    };
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }

    let resp = client.register(username, &password).await?;
    output::print_status(&format!("{} ({})", resp.message, resp.user_id), global.quiet);
    Ok(())
}
