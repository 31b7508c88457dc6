//! Login, register, logout and whoami.

use std::io::{self, BufRead};

use anyhow::{bail, Context, Result};

use shopfront_core::account::{self, Credentials};

use super::{GlobalArgs, LoginArgs};

/// Run the login command.
pub async fn login(args: LoginArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = super::context(global)?;
    let credentials = credentials(args)?;

    account::sign_in(ctx.api(), ctx.session(), &credentials).await?;
    print_signed_in(&credentials.username, global, ctx.config())
}

/// Run the register command.
pub async fn register(args: LoginArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = super::context(global)?;
    let credentials = credentials(args)?;

    account::sign_up(ctx.api(), ctx.session(), &credentials).await?;
    if !global.wants_json(ctx.config()) {
        println!("Account created.");
    }
    print_signed_in(&credentials.username, global, ctx.config())
}

/// Run the logout command.
pub fn logout(global: &GlobalArgs) -> Result<()> {
    let ctx = super::context(global)?;
    let was_signed_in = ctx.session().is_authenticated();
    ctx.session().logout();

    if global.wants_json(ctx.config()) {
        return crate::ui::print_json(&serde_json::json!({ "authenticated": false }));
    }

    if was_signed_in {
        println!("Signed out.");
    } else {
        println!("Not signed in.");
    }
    Ok(())
}

/// Run the whoami command.
pub async fn whoami(global: &GlobalArgs) -> Result<()> {
    let ctx = super::context(global)?;
    let json = global.wants_json(ctx.config());

    if !ctx.session().is_authenticated() {
        if json {
            return crate::ui::print_json(&serde_json::json!({ "authenticated": false }));
        }
        println!("Not signed in.");
        return Ok(());
    }

    let profile = account::current_user(ctx.api(), ctx.session()).await?;
    if json {
        crate::ui::print_json(&serde_json::json!({
            "authenticated": true,
            "username": profile.username,
        }))
    } else {
        println!("Signed in as {}", profile.username);
        Ok(())
    }
}

fn print_signed_in(
    username: &str,
    global: &GlobalArgs,
    config: &shopfront_core::config::Config,
) -> Result<()> {
    if global.wants_json(config) {
        return crate::ui::print_json(&serde_json::json!({
            "authenticated": true,
            "username": username,
            "persisted": !global.ephemeral,
        }));
    }

    println!("Signed in as {username}");
    if global.ephemeral {
        println!("Session kept in memory only; it ends when this command exits.");
    }
    Ok(())
}

fn credentials(args: LoginArgs) -> Result<Credentials> {
    let password = match (args.password, args.password_stdin) {
        (Some(password), _) => password,
        (None, true) => {
            let mut line = String::new();
            io::stdin()
                .lock()
                .read_line(&mut line)
                .context("Failed to read password from stdin")?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
        (None, false) => bail!(
            "No password given. Use --password, SHOPFRONT_PASSWORD or --password-stdin."
        ),
    };

    Ok(Credentials::new(args.username, password))
}
