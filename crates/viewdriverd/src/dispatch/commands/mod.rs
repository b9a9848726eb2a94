//! Built-in protocol commands.

/// Declares a command struct built from its request arguments.
macro_rules! command {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name {
            args: $crate::dispatch::CommandArgs,
        }

        impl From<$crate::dispatch::CommandArgs> for $name {
            fn from(args: $crate::dispatch::CommandArgs) -> Self {
                Self { args }
            }
        }
    };
    ($(#[$meta:meta])* $name:ident, ignores_args) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name;

        impl From<$crate::dispatch::CommandArgs> for $name {
            fn from(_args: $crate::dispatch::CommandArgs) -> Self {
                Self
            }
        }
    };
}

mod create_session;
mod sessions;
mod status;
mod view_info;
mod window;

pub use self::create_session::CreateSession;
pub use self::sessions::{ListSessions, SessionWithId};
pub use self::status::StatusCommand;
pub use self::view_info::{GetTitle, GetUrl};
pub use self::window::{GetWindowHandle, GetWindowHandles, WindowCommand};
