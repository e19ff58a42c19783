//! Constant-memory handling of BER-TLV encoded data.
//!
//! This crate implements a constrained, definite-length-only variant of the
//! Basic Encoding Rules as used for structured data objects on platforms
//! where nothing may be allocated while data is being processed. Instead of
//! materializing a parse tree, [`Parser`] walks a caller-owned byte buffer
//! and reports every element to a [`Visitor`]; [`Builder`] accumulates
//! elements in a flat, bounded table and serializes them in a single pass.
//! A builder is itself a visitor, so a parser can drive one directly to
//! copy or restructure a TLV stream without intermediate storage.

pub use self::build::Builder;
pub use self::error::Error;
pub use self::parse::{Frames, Parser};
pub use self::tag::{Class, Tag};
pub use self::visit::Visitor;

pub mod build;
pub mod error;
pub mod length;
pub mod parse;
pub mod tag;
pub mod visit;
