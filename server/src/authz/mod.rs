pub mod capability;
pub mod gate;
pub mod hierarchy;

pub use capability::{capability_for, Capability};
pub use gate::{can_accept_comment, can_annotate, can_manage_users, can_view};
pub use hierarchy::{is_superior_of, SupervisorLookup, MAX_DEPTH};
