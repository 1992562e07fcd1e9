//! Listener socket setup.

use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;

/// Bind a TCP listener with `SO_REUSEADDR` so a restarted server can take
/// its port back while old connections sit in `TIME_WAIT`.
///
/// The socket is left non-blocking, ready for `tokio::net::TcpListener::from_std`.
pub fn bind_reusable_listener(addr: SocketAddr) -> std::io::Result<std::net::TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;

    socket.bind(&addr.into())?;
    socket.listen(1024)?;

    Ok(socket.into())
}
