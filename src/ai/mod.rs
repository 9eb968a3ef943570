pub mod prompt;
pub mod suggest;
pub mod transcript;

pub use transcript::Transcript;
