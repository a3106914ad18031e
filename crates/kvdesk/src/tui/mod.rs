//! Interactive terminal UI.
//!
//! Layout:
//! ```text
//! ┌ http://127.0.0.1:5001 ──┐┌ user:42 ─────────────────────┐
//! │▌ user:42                ││  String   JSON   1.2 KB      │
//! │  user:43                ││                              │
//! │  ...                    ││ { "name": "Ada", ... }       │
//! └─────────────────────────┘└──────────────────────────────┘
//!   12/40 keys
//!   mode:Key [Tab mode] [↑↓ select] ...
//!   [Saved user:42]
//! ▌ user█
//! ```
//!
//! All store calls run on worker threads ([`worker`]); the render loop in
//! [`app`] only drains their channels.

mod app;
mod input;
mod ui;
mod worker;

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use kvdesk_core::RecordStore;

use crate::settings::Target;

#[derive(Args, Debug)]
#[command(about = "Interactive terminal UI")]
pub struct TuiArgs {}

pub fn execute(_args: TuiArgs, target: &Target) -> Result<()> {
    let store: Arc<dyn RecordStore> = Arc::new(target.connect()?);
    app::run(store, &target.url)
}
