use clap::Parser;
use vitals2coach::cli::context::CommandContext;
use vitals2coach::cli::{commands, Cli, Commands};
use vitals2coach::logging::init_tracing;

async fn dispatch(ctx: &CommandContext, command: Commands) -> anyhow::Result<()> {
    match command {
        // Handled before a context exists
        Commands::Init(_) => {}
        Commands::Login(args) => commands::execute_login(ctx, args).await?,
        Commands::Register(args) => commands::execute_register(ctx, args).await?,
        Commands::ResetPassword(args) => commands::execute_reset_password(ctx, args).await?,
        Commands::Logout => commands::execute_logout(ctx).await?,
        Commands::Status => commands::execute_status(ctx)?,
        Commands::Sync(args) => commands::execute_sync(ctx, args).await?,
        Commands::Coach(args) => commands::execute_coach(ctx, args).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.log_json);

    match cli.command {
        Commands::Init(args) => commands::execute_init(&cli.global, args)?,
        command => {
            let ctx = CommandContext::new(&cli.global)?;
            dispatch(&ctx, command).await?
        }
    }

    Ok(())
}
