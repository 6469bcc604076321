mod scheduler;

pub use scheduler::{Scheduler, Trigger};
