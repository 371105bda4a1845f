pub mod app;
pub mod cli;
pub mod constants;
pub mod dispatch;
pub mod runtime;
pub mod session;
pub mod utils;

pub use app::{load_config, Config, SubmitPolicy};
pub use dispatch::{DispatchFailure, HttpDispatcher, Prompt, Reply, ResponseDispatcher};
pub use session::{ConversationHistory, Message, Origin, SessionController, SessionHandle};
pub use utils::CoachError;
