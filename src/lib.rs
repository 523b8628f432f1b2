//! A minimal RakNet client for a game server's session protocol.
//!
//! The client walks the offline handshake, opens a reliable session,
//! answers the server's player-verification challenge, keeps the session
//! alive for a while, and then disconnects cleanly.
//!
//! ```no_run
//! use raknet_autopause::{Session, SessionConfig};
//!
//! # async fn demo() -> Result<(), raknet_autopause::RaknetError> {
//! let config = SessionConfig::new("127.0.0.1:27016".parse().unwrap(), "0.2.5954.26174");
//! let summary = Session::connect(config).await?;
//! println!("sent {} frames", summary.frames_sent);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod game;
pub mod protocol;
pub mod session;
pub mod transport;

pub use error::RaknetError;
pub use session::{Session, SessionConfig, SessionSummary};
