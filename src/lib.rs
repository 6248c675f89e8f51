//! Lowering of 128-bit SIMD micro-operations to x86-64 machine code.
//!
//! The [`ir`] module defines the micro-operation stream; [`backend::x64`]
//! holds the capability-tiered emitters, the strategy table that ranks them,
//! and the stack-marshalled fallback protocol for operations with no
//! efficient host encoding.

pub mod backend;
pub mod ir;
