//! Error taxonomy for the crash-dump write pipeline.
//!
//! Every variant here is fatal: there is no recovery at crash time, only
//! a single diagnostic print and a halt. Callers propagate with `?` all
//! the way up to the entry point.

use core::fmt;

/// The five ways the payload can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadError {
    /// A PCI device, GPT partition, or root-directory filename was not found.
    NotFound(&'static str),
    /// An on-disk structure failed a format check (signature, magic, depth, ...).
    BadFormat(&'static str),
    /// The virtio-blk device reported a non-OK completion status.
    DeviceError(u8),
    /// A bounded resource (heap, page pool, virtqueue descriptors) ran out.
    Exhaustion(&'static str),
    /// A sanity check caught an impossible condition (null deref, misalign, overflow).
    SanityTrap(&'static str),
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadError::NotFound(what) => write!(f, "not found: {what}"),
            PayloadError::BadFormat(what) => write!(f, "bad format: {what}"),
            PayloadError::DeviceError(status) => write!(f, "device error: status={status:#x}"),
            PayloadError::Exhaustion(what) => write!(f, "exhausted: {what}"),
            PayloadError::SanityTrap(what) => write!(f, "sanity trap: {what}"),
        }
    }
}

pub type Result<T> = core::result::Result<T, PayloadError>;
