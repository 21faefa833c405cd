//! Terminal example.
//!
//! Reads commands from stdin and prints output to stdout, as a dedicated
//! server would.
//!
//! Run with: `cargo run --example terminal --features terminal`
//!
//! Commands:
//! - `help` - List available commands
//! - `say <message...>` - Broadcast a message
//! - `kick <player:word> [reason]` - Requires the `admin.kick` permission
//! - `op` - Grant yourself every permission
//! - `quit` - Exit the application

use bevy::prelude::*;
use kimiko::prelude::*;

fn main() {
    println!("=== Terminal Command Example ===");
    println!("Type commands and press Enter. Type 'quit' to exit.");
    println!();

    // Ensure output is flushed before starting the app
    use std::io::Write;
    let _ = std::io::stdout().flush();

    App::new()
        .add_plugins(MinimalPlugins)
        .add_plugins(CommandPlugin::default())
        .insert_resource(ConsolePermissions::restricted(["chat.say"]))
        .insert_resource(TerminalConfig {
            colored: true,
            show_echo: false,
        })
        .add_systems(Startup, setup)
        .add_systems(Last, quit_when_requested.run_if(resource_exists::<QuitRequested>))
        .run();
}

#[derive(Resource)]
struct QuitRequested;

fn quit_when_requested(mut exit: MessageWriter<AppExit>) {
    exit.write(AppExit::Success);
}

fn setup(mut console: CommandConsole) {
    console
        .command("server:say <message:string...>")
        .description("Broadcast a message")
        .permission("chat.say")
        .handler(|ctx, _, args| {
            let words: Vec<&str> = args.get_list("message").iter().filter_map(ArgValue::as_str).collect();
            ctx.reply(format!("[SERVER] {}", words.join(" ")));
            Ok(CommandResult::SUCCESS)
        })
        .register()
        .expect("valid say command");

    console
        .command("server:kick <player:word> [reason]")
        .description("Disconnect a player")
        .permission("admin.kick")
        .suggestions(|_, _, _| vec!["alice".into(), "bob".into()])
        .handler(|ctx, _, args| {
            let player = args.get_str_or("player", "");
            let reason = args.get_str_or("reason", "no reason given");
            ctx.reply(format!("Kicked {player} ({reason})"));
            Ok(CommandResult::SUCCESS)
        })
        .register()
        .expect("valid kick command");

    console
        .command("server:op")
        .description("Grant every permission")
        .handler(|ctx, _, _| {
            ctx.defer(|world, ctx| {
                world.resource_mut::<ConsolePermissions>().set_unrestricted(true);
                ctx.reply("You are now an operator");
            });
            Ok(CommandResult::SUCCESS)
        })
        .register()
        .expect("valid op command");

    console
        .command("server:quit")
        .alias("exit")
        .description("Exit the application")
        .handler(|ctx, _, _| {
            ctx.defer(|world, _| {
                world.insert_resource(QuitRequested);
            });
            Ok(CommandResult::SUCCESS)
        })
        .register()
        .expect("valid quit command");
}
