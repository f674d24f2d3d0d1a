use dlo_core::time::{format_ts, parse_local_as_utc};
use dlo_memories::{Memory, NewMemory};

use crate::app::App;
use crate::cli::MemoryAction;

pub async fn run(app: &App, action: MemoryAction) -> anyhow::Result<()> {
    match action {
        MemoryAction::Schedule {
            user,
            title,
            to,
            message,
            at,
        } => {
            let owner = app.user_by_email(&user)?;
            let memory = app.memories()?.create(
                &owner.id,
                NewMemory {
                    title,
                    recipient_email: to,
                    message,
                    send_at: parse_local_as_utc(&at)?,
                },
            )?;
            println!("Memory scheduled! ID: {}", memory.id);
            print_memory(&memory);
        }
        MemoryAction::List { user } => {
            let owner = app.user_by_email(&user)?;
            let memories = app.memories()?.list_for_owner(&owner.id)?;
            println!("Memories ({})", memories.len());
            for m in &memories {
                print_memory(m);
            }
        }
        MemoryAction::SendNow { user, id } => {
            let owner = app.user_by_email(&user)?;
            let report = app.engine()?.send_now(&id, &owner.id).await?;
            if report.delivered {
                println!("Memory sent!");
            } else {
                println!("Delivery failed; see the log for the cause.");
            }
            if !report.recorded {
                println!("Status was changed by another writer in the meantime.");
            }
            print_memory(&report.memory);
        }
        MemoryAction::Delete { user, id } => {
            let owner = app.user_by_email(&user)?;
            app.memories()?.delete(&id, &owner.id)?;
            println!("Memory deleted!");
        }
    }
    Ok(())
}

fn print_memory(m: &Memory) {
    let sent = m.sent_at.map(format_ts).unwrap_or_else(|| "-".to_string());
    println!(
        "- [{}] {} -> {} at {} ({}, sent {})",
        m.id,
        m.title,
        m.recipient_email,
        format_ts(m.send_at),
        m.status,
        sent
    );
}
