//! # ticksim-types::packet
//!
//! Defines `Packet`, the value object carried on the in-transit queue between
//! a send call and a delivery decision.

use crate::id::Address;
use bytes::Bytes;

/// A small tag distinguishing payload kinds on the wire. Node code chooses
/// its own numbering; the simulator never interprets it.
pub type Protocol = u16;

/// An immutable message in transit. `src` and `dest` are always concrete
/// addresses — `BROADCAST` is expanded into one packet per destination at
/// send time and never appears here.
#[derive(Clone, Debug)]
pub struct Packet {
    pub src: Address,
    pub dest: Address,
    pub protocol: Protocol,
    pub payload: Bytes,
}
