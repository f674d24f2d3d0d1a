use dlo_core::time::parse_date;
use dlo_memories::{Message, MessageDraft};

use crate::app::App;
use crate::cli::MessageAction;

pub fn run(app: &App, action: MessageAction) -> anyhow::Result<()> {
    let store = app.messages()?;
    match action {
        MessageAction::Create {
            user,
            to,
            content,
            date,
        } => {
            let owner = app.user_by_email(&user)?;
            let message = store.create(
                &owner.id,
                MessageDraft {
                    recipient: to,
                    content,
                    delivery_date: parse_date(&date)?,
                },
            )?;
            println!("Message created! ID: {}", message.id);
        }
        MessageAction::List { user } => {
            let owner = app.user_by_email(&user)?;
            let messages = store.list_for_owner(&owner.id)?;
            println!("Messages ({})", messages.len());
            for m in &messages {
                print_message(m);
            }
        }
        MessageAction::Show { user, id } => {
            let owner = app.user_by_email(&user)?;
            let m = store.get(&id, &owner.id)?;
            print_message(&m);
            println!("\n{}", m.content);
        }
        MessageAction::Edit {
            user,
            id,
            to,
            content,
            date,
        } => {
            let owner = app.user_by_email(&user)?;
            let current = store.get(&id, &owner.id)?;
            let delivery_date = match date {
                Some(d) => parse_date(&d)?,
                None => current.delivery_date,
            };
            let updated = store.update(
                &id,
                &owner.id,
                MessageDraft {
                    recipient: to.unwrap_or(current.recipient),
                    content: content.unwrap_or(current.content),
                    delivery_date,
                },
            )?;
            println!("Message updated:");
            print_message(&updated);
        }
        MessageAction::Delete { user, id } => {
            let owner = app.user_by_email(&user)?;
            store.delete(&id, &owner.id)?;
            println!("Message deleted!");
        }
    }
    Ok(())
}

fn print_message(m: &Message) {
    println!(
        "- [{}] to {} on {}{}",
        m.id,
        m.recipient,
        m.delivery_date,
        if m.sent { " (sent)" } else { "" }
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support;
    use dlo_users::account::create_user;

    #[test]
    fn create_then_edit_keeps_unchanged_fields() {
        let app = test_support::app();
        let owner = create_user(&app.connection().unwrap(), "pa@example.com", "Pa", "secret1")
            .unwrap()
            .id;
        run(
            &app,
            MessageAction::Create {
                user: "pa@example.com".into(),
                to: "Grandson".into(),
                content: "Happy 18th".into(),
                date: "2031-04-02".into(),
            },
        )
        .unwrap();

        let store = app.messages().unwrap();
        let id = store.list_for_owner(&owner).unwrap()[0].id.clone();
        run(
            &app,
            MessageAction::Edit {
                user: "pa@example.com".into(),
                id: id.clone(),
                to: None,
                content: Some("Happy 18th, kiddo".into()),
                date: None,
            },
        )
        .unwrap();

        let m = store.get(&id, &owner).unwrap();
        assert_eq!(m.recipient, "Grandson");
        assert_eq!(m.content, "Happy 18th, kiddo");
        assert_eq!(m.delivery_date.to_string(), "2031-04-02");
        assert!(!m.sent);
    }

    #[test]
    fn bad_date_is_rejected() {
        let app = test_support::app();
        create_user(&app.connection().unwrap(), "pa@example.com", "Pa", "secret1").unwrap();
        assert!(run(
            &app,
            MessageAction::Create {
                user: "pa@example.com".into(),
                to: "x".into(),
                content: "y".into(),
                date: "02/04/2031".into(),
            },
        )
        .is_err());
    }
}
