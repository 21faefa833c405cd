//! Minimal headless example.
//!
//! Registers a few commands and drives them programmatically without any UI.
//!
//! Run with: `cargo run --example minimal`

use bevy::prelude::*;
use kimiko::prelude::*;

fn main() {
    App::new()
        .add_plugins(MinimalPlugins)
        .add_plugins(CommandPlugin::default().with_prefix("/"))
        .init_resource::<Reminders>()
        .add_systems(Startup, setup)
        .add_systems(Update, send_test_commands.run_if(run_once))
        .add_systems(PostUpdate, (process_outputs, exit_after_frames))
        .run();
}

#[derive(Resource, Default)]
struct Reminders(Vec<String>);

fn setup(mut console: CommandConsole) {
    console
        .command("chloe:remindme <event> <date> [repeat:boolean] [users:int...]")
        .description("Schedule a reminder")
        .alias("remind")
        .handler(|ctx, _, args| {
            let event = args.get_str_or("event", "").to_string();
            let date = args.get_str_or("date", "").to_string();
            let repeat = args.get_bool("repeat").unwrap_or(false);
            let users = args.get_list("users").len();

            ctx.defer(move |world, ctx| {
                world.resource_mut::<Reminders>().0.push(event.clone());
                ctx.reply(format!(
                    "Reminder '{event}' at {date} (repeat: {repeat}, users: {users})"
                ));
            });
            Ok(CommandResult::SUCCESS)
        })
        .register()
        .expect("valid remindme command");

    console
        .command("chloe:reminders")
        .description("Manage reminders")
        .command("chloe:clear", |clear| {
            clear.permission("reminders.clear").handler(|ctx, _, _| {
                ctx.defer(|world, ctx| {
                    world.resource_mut::<Reminders>().0.clear();
                    ctx.reply("Reminders cleared");
                });
                Ok(CommandResult::SUCCESS)
            })
        })
        .handler(|ctx, _, _| {
            ctx.defer(|world, ctx| {
                let reminders = world.resource::<Reminders>().0.join(", ");
                ctx.reply(format!("Reminders: [{reminders}]"));
            });
            Ok(CommandResult::SUCCESS)
        })
        .register()
        .expect("valid reminders command");

    println!("Commands registered: {:?}", console.complete("/"));
}

/// Send some test commands programmatically.
fn send_test_commands(mut events: MessageWriter<CommandInputEvent>) {
    println!("\n--- Sending test commands ---");

    events.write(CommandInputEvent::new(
        r#"/remindme "this is an event" 23:35:20 yes 5050 0o56"#,
    ));
    events.write(CommandInputEvent::new("/remind lunch 12:00"));
    events.write(CommandInputEvent::new("/reminders"));
    events.write(CommandInputEvent::new("/remindme"));
    events.write(CommandInputEvent::new("/remindme party tomorrow maybe"));
    events.write(CommandInputEvent::new("/nothing"));
    events.write(CommandInputEvent::new("just chatting"));
    events.write(CommandInputEvent::new("/help reminders"));
}

/// Print command output.
fn process_outputs(mut events: MessageReader<CommandOutputEvent>) {
    for event in events.read() {
        let prefix = match event.level {
            CommandOutputLevel::Info => "[INFO]",
            CommandOutputLevel::Warn => "[WARN]",
            CommandOutputLevel::Error => "[ERROR]",
            CommandOutputLevel::Command => "[$]",
            CommandOutputLevel::Result => "[>]",
        };
        println!("{} {}", prefix, event.message);
    }
}

fn exit_after_frames(mut frames: Local<u32>, mut exit: MessageWriter<AppExit>) {
    *frames += 1;
    if *frames >= 3 {
        exit.write(AppExit::Success);
    }
}
