//! XDP Lab Data Plane
//!
//! Per-packet programs modelled on the driver-level XDP hook, run in user
//! space over owned frames.
//!
//! # Architecture
//!
//! ```text
//!            Frame (head-room | data | tail-room)
//!                          │
//!                          ▼
//!   ┌──────────────────────────────────────────────┐
//!   │ Cursor: Ethernet → [VLAN] → IPv4 → ICMP/TCP/UDP
//!   └──────────────────────┬───────────────────────┘
//!                          │
//!        ┌─────────────────┼──────────────────┐
//!        ▼                 ▼                  ▼
//!   ┌──────────┐   ┌──────────────┐   ┌──────────────┐
//!   │ Mutator  │   │  Admission   │   │  Forwarding  │
//!   │ VLAN/port│   │ threshold /  │   │ routes, MACs │
//!   │ /MAC     │   │ sketch       │   │ devmap       │
//!   └────┬─────┘   └──────┬───────┘   └──────┬───────┘
//!        └────────────────┼──────────────────┘
//!                         ▼
//!           XdpAction: PASS | DROP | ABORTED | REDIRECT
//! ```
//!
//! # Invariants
//!
//! 1. **Bounds first**: no header byte is read before the cursor has
//!    checked it lies inside the frame
//! 2. **No stale views**: resizing takes `&mut Frame` and hands back a new
//!    view, so nothing parsed before a resize can be used after it
//! 3. **Bounded work**: every program does a fixed number of steps per
//!    packet
//! 4. **Shared state is atomic**: tables are read-only while packets flow;
//!    counters and sketch slots only see relaxed fetch-and-add

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod admission;
pub mod buffer;
pub mod config;
pub mod cursor;
pub mod engine;
pub mod flow;
pub mod hash;
pub mod mutate;
pub mod programs;
pub mod proto;
pub mod stats;
pub mod tables;

#[cfg(test)]
pub(crate) mod testutil;

pub use admission::{HeavyHitterSketch, SketchConfig, SourceThresholds};
pub use buffer::Frame;
pub use config::{ConfigError, LabConfig};
pub use cursor::{Cursor, Header};
pub use engine::{Engine, EngineConfig, EngineError, Verdict};
pub use flow::FlowKey;
pub use programs::{ProgramKind, XdpProgram};
pub use stats::StatsMap;
pub use tables::{ForwardingTables, Tables};
pub use xdplab_common::{PacketError, XdpAction};
