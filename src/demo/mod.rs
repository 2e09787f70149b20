//! Demo data and server
//!
//! A small song-lyrics list served page by page, either in memory or over
//! HTTP. Used by the `demo` and `serve` commands and handy for trying a UI
//! against a slow paginated backend.

mod server;

pub use server::{router, serve, DemoServerConfig};

use crate::source::MemorySource;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Latency of the demo backend
pub const DEMO_LATENCY: Duration = Duration::from_millis(500);

/// Page size used by the demo
pub const DEMO_PAGE_SIZE: u64 = 5;

const LYRICS: &str = "\
We're no strangers to love
You know the rules and so do I
A full commitment's what I'm thinking of
You wouldn't get this from any other guy
I just wanna tell you how I'm feeling
Gotta make you understand
Never gonna give you up
Never gonna let you down
Never gonna run around and desert you
Never gonna make you cry
Never gonna say goodbye
Never gonna tell a lie and hurt you
We've known each other for so long
Your heart's been aching but you're too shy to say it
Inside we both know what's been going on
We know the game and we're gonna play it
And if you ask me how I'm feeling
Don't tell me you're too blind to see
Never gonna give you up
Never gonna let you down
Never gonna run around and desert you
Never gonna make you cry
Never gonna say goodbye
Never gonna…";

/// One line of the demo list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    /// Text of the line
    pub value: String,
}

impl Line {
    /// Create a line
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// All demo lines, in order
pub fn lyrics() -> Vec<Line> {
    LYRICS.lines().map(Line::new).collect()
}

/// In-memory source over the demo lines
pub fn lyrics_source(latency: Option<Duration>) -> MemorySource<Line> {
    let source = MemorySource::new(lyrics());
    match latency {
        Some(latency) => source.with_latency(latency),
        None => source,
    }
}
