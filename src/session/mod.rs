/// Session management module - Gateway

mod controller;
mod handle;
mod history;
mod intent;
mod message;
mod state;
mod view_sync;

pub use controller::SessionController;
pub use handle::{Accepted, SessionHandle};
pub use history::ConversationHistory;
pub use intent::QuickIntent;
pub use message::{Message, Origin};
pub use state::{Phase, SessionState, SubmitError, TurnOutcome};
pub use view_sync::{SessionView, ViewReceiver, ViewSync, ViewUpdate};
