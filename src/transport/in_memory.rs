use tokio::io::{duplex, DuplexStream};

use crate::protocol::{PeerRole, HEADER_LEN, MAX_BODY_LEN};
use crate::transport::Connection;

/// Per-direction buffer of an in-memory pair; a few full frames.
const PAIR_BUFFER: usize = 4 * (HEADER_LEN + MAX_BODY_LEN);

/// A connected `(server, client)` pair backed by an in-memory duplex pipe.
pub fn pair() -> (Connection<DuplexStream>, Connection<DuplexStream>) {
    let (a, b) = duplex(PAIR_BUFFER);
    (
        Connection::new(PeerRole::Server, a),
        Connection::new(PeerRole::Client, b),
    )
}
