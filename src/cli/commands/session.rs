use anyhow::{Context, Result};

use crate::cli::context::CommandContext;
use crate::cli::{LoginArgs, RegisterArgs, ResetPasswordArgs};
use crate::session::{Credentials, Profile, SessionError, SessionState};

pub async fn execute_login(ctx: &CommandContext, args: LoginArgs) -> Result<()> {
    let credentials = Credentials {
        email: args.email,
        password: args.password,
    };
    let identity = ctx.gate.login(&credentials).await.context("Login failed")?;

    println!("Logged in as player {}", identity.player_id);
    Ok(())
}

pub async fn execute_register(ctx: &CommandContext, args: RegisterArgs) -> Result<()> {
    let profile = Profile {
        fullname: args.fullname,
        phone: args.phone,
        email: args.email.clone(),
        password: args.password,
        confirm_password: args.confirm_password,
    };
    ctx.gate
        .register(&profile)
        .await
        .context("Registration failed")?;

    println!("Account created for {}", args.email);
    println!("Next: vitals2coach login {}", args.email);
    Ok(())
}

pub async fn execute_reset_password(ctx: &CommandContext, args: ResetPasswordArgs) -> Result<()> {
    ctx.gate
        .request_password_reset(&args.email)
        .await
        .context("Password reset request failed")?;

    println!("A reset link has been sent to {}", args.email);
    Ok(())
}

pub async fn execute_logout(ctx: &CommandContext) -> Result<()> {
    ctx.gate.logout().await?;
    println!("Logged out");
    Ok(())
}

pub fn execute_status(ctx: &CommandContext) -> Result<()> {
    println!("==> API: {}", ctx.client.base_url());
    println!("==> Session: {}", ctx.config.session_file()?.display());

    match ctx.gate.require_identity() {
        Ok(identity) => {
            println!("    state: {:?}", ctx.gate.state());
            println!("    player_id: {}", identity.player_id);
        }
        Err(SessionError::AuthRequired) => {
            println!("    state: {:?}", SessionState::Anonymous);
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
