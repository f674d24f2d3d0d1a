use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "dlo")]
#[command(author, version, about = "Dear Loved One: messages delivered when the time comes")]
pub struct Cli {
    /// Config file (default: $DLO_CONFIG, then ./dlo.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the delivery scheduler until Ctrl-C
    Serve,
    /// Run a single delivery cycle and print its report
    DeliverOnce,
    /// Manage accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage scheduled memories
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },
    /// Manage date-stamped messages
    Message {
        #[command(subcommand)]
        action: MessageAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserAction {
    /// Register a new account
    Create {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, default_value = "")]
        name: String,
        #[arg(short, long)]
        password: String,
    },
    /// List every account
    List,
    /// Delete an account together with its memories and messages
    Delete {
        #[arg(short, long)]
        email: String,
    },
    /// Check an email/password pair
    Check {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum MemoryAction {
    /// Schedule a memory for delivery
    Schedule {
        /// Owner's account email
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        title: String,
        /// Recipient email address
        #[arg(long)]
        to: String,
        #[arg(short, long)]
        message: String,
        /// Delivery time, e.g. 2030-05-01T09:00 (read as UTC) or an RFC 3339 instant
        #[arg(long)]
        at: String,
    },
    /// List the owner's memories, newest first
    List {
        #[arg(short, long)]
        user: String,
    },
    /// Send a memory immediately, whatever its status
    SendNow {
        #[arg(short, long)]
        user: String,
        id: String,
    },
    Delete {
        #[arg(short, long)]
        user: String,
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum MessageAction {
    Create {
        #[arg(short, long)]
        user: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        content: String,
        /// Delivery date, YYYY-MM-DD
        #[arg(long)]
        date: String,
    },
    List {
        #[arg(short, long)]
        user: String,
    },
    Show {
        #[arg(short, long)]
        user: String,
        id: String,
    },
    /// Change any of recipient, content or date
    Edit {
        #[arg(short, long)]
        user: String,
        id: String,
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        date: Option<String>,
    },
    Delete {
        #[arg(short, long)]
        user: String,
        id: String,
    },
}
