//! Fixture domain model
//!
//! A [`Container`] owns its artifacts, playbooks, notes and pins; nothing
//! here outlives the container it belongs to.

mod artifact;
mod container;
pub mod fields;
mod playbook;

pub use artifact::Artifact;
pub use container::{Container, Note, Pin};
pub use fields::{Field, FieldTable};
pub use playbook::{Action, ActionStatus, Playbook};
