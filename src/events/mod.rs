//! # Events Module
//!
//! Event-driven progress reporting for the reconciliation workflow.
//!
//! ## Design
//! The engine emits events through a channel, allowing any front end
//! (CLI, GUI, web) to subscribe and render progress. Snapshots are
//! last-write-wins: every successful poll produces an event, duplicates
//! included, and it is the listener's job to decide what changed.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         match event {
//!             Event::Scan(ScanEvent::Progress(p)) => {
//!                 println!("{}/{} examined", p.current, p.total)
//!             }
//!             Event::Rebuild(RebuildEvent::Progress(p)) => {
//!                 println!("{} fixed", p.stats.fixed_links)
//!             }
//!             _ => {}
//!         }
//!     }
//! });
//!
//! workflow.open(sizes).await?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
