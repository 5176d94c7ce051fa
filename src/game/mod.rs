pub mod cascade;
pub mod compactor;
pub mod grid;
pub mod scheduler;
pub mod scorer;
pub mod selection;
pub mod session;
pub mod validator;

pub use cascade::{CascadeEngine, CascadePhase};
pub use compactor::GridCompactor;
pub use grid::{Grid, GridGenerator};
pub use scheduler::{ImmediateScheduler, Scheduler, TokioScheduler};
pub use scorer::{CascadeBonus, Scorer};
pub use selection::SelectionPath;
pub use session::{GameSession, SessionConfig};
pub use validator::WordEvaluator;
