//! # thumb-mend CLI
//!
//! Command-line interface for the thumbnail mender.
//!
//! ## Usage
//! ```bash
//! thumb-mend scan http://localhost:8188/api/thumbnails
//! thumb-mend rebuild http://localhost:8188/api/thumbnails --sizes small,medium --yes
//! ```

mod cli;

use thumbnail_mender::Result;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
