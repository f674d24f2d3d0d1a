use dlo_users::account;

use crate::app::App;
use crate::cli::UserAction;

pub fn run(app: &App, action: UserAction) -> anyhow::Result<()> {
    let conn = app.connection()?;
    match action {
        UserAction::Create {
            email,
            name,
            password,
        } => {
            let user = account::create_user(&conn, &email, &name, &password)?;
            println!("User created! ID: {}", user.id);
        }
        UserAction::List => {
            let users = account::list_users(&conn)?;
            println!("Users ({})", users.len());
            for u in users {
                println!("- [{}] {} <{}> since {}", u.id, u.name, u.email, u.created_at);
            }
        }
        UserAction::Delete { email } => {
            let user = app.user_by_email(&email)?;
            account::delete_user(&conn, &user.id)?;
            println!("User {} deleted", user.email);
        }
        UserAction::Check { email, password } => {
            match account::authenticate(&conn, &email, &password)? {
                Some(u) => println!("OK: {} ({})", u.email, u.id),
                None => anyhow::bail!("invalid email or password"),
            }
        }
    }
    Ok(())
}
