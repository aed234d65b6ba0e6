use std::net::{IpAddr, UdpSocket};

/// 本机在局域网中的地址
///
/// UDP connect 只选路由，不发送数据。
pub fn local_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    socket.local_addr().ok().map(|addr| addr.ip())
}
