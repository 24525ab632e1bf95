//! pokerd - Planning-poker room server
//!
//! This crate provides the core infrastructure for the room server:
//! - `coordinator` - Room coordinator actor owning every participant
//! - `registry` - Participant registry kept by the coordinator
//! - `server` - WebSocket server for client connections
//! - `config` - Listen address resolution
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        pokerd                               │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌─────────────────┐     ┌─────────────────────────────┐   │
//! │  │   PokerServer   │────▶│     RoomCoordinator         │   │
//! │  │  (WebSocket)    │     │  (participant state owner)  │   │
//! │  └────────┬────────┘     └──────────────┬──────────────┘   │
//! │           │                             │                   │
//! │           │ connections                 │ outbound events   │
//! │           ▼                             ▼                   │
//! │  ┌─────────────────┐     ┌─────────────────────────────┐   │
//! │  │ConnectionHandler│◀────│   BroadcastGroups           │   │
//! │  │  (per client)   │     │   (per-room multicast)      │   │
//! │  └─────────────────┘     └─────────────────────────────┘   │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All production code in this crate follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

pub mod config;
pub mod coordinator;
pub mod registry;
pub mod server;
