//! Docgate ACL — row-level access-control label provisioning.
//!
//! This crate populates every document in a collection with a fresh,
//! independently-random ACL label set (`ACL1`, `ACL2`, `ACL3`), safely and
//! observably:
//!
//! - [`LabelGenerator`]: injectable, seedable source of label sets.
//! - [`Provisioner`]: two-state plan/apply protocol — a dry run never
//!   mutates, and apply requires explicit [`Confirmation`].
//!
//! Labels are independent uniform draws; "unique" means independently
//! randomized per document, not globally distinct.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod labels;
pub mod provision;

pub use labels::{ACL_FIELDS, AclLabelSet, AclRange, LabelGenerator};
pub use provision::{Confirmation, ProvisionPlan, ProvisionReport, Provisioner};
