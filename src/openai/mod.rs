pub mod core;

pub use self::core::{CompletionError, Message, ResponseFormat, Role, completion, message_content};
