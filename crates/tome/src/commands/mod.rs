//! CLI command implementations.

mod build;
mod check;
mod publish;

pub(crate) use build::BuildArgs;
pub(crate) use check::CheckArgs;
pub(crate) use publish::PublishArgs;
