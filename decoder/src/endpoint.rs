use std::fmt;
use std::net::IpAddr;

/// `(ip, port)` identifying one side of a TCP flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Endpoint {
    pub ip: IpAddr,
    pub port: u16,
}

impl Endpoint {
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Endpoint { ip, port }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// Serializes as `"ip:port"`, matching the `src`/`dst` fields of the JSONL event format.
impl serde::Serialize for Endpoint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

/// The client-side `Endpoint` of a flow against the configured MySQL port —
/// the non-3306 side, inferred from direction rather than carried on the wire.
pub type ClientKey = Endpoint;

/// Decides which of the two endpoints observed in a captured segment is the
/// client, given the configured MySQL port.
pub fn client_key(src: Endpoint, dst: Endpoint, mysql_port: u16) -> Option<ClientKey> {
    match (src.port == mysql_port, dst.port == mysql_port) {
        (true, false) => Some(dst),
        (false, true) => Some(src),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_key_picks_the_non_mysql_side() {
        let client = Endpoint::new("127.0.0.1".parse().unwrap(), 55123);
        let server = Endpoint::new("127.0.0.1".parse().unwrap(), 3306);
        assert_eq!(client_key(client, server, 3306), Some(client));
        assert_eq!(client_key(server, client, 3306), Some(client));
    }

    #[test]
    fn client_key_none_when_neither_side_is_mysql() {
        let a = Endpoint::new("127.0.0.1".parse().unwrap(), 1111);
        let b = Endpoint::new("127.0.0.1".parse().unwrap(), 2222);
        assert_eq!(client_key(a, b, 3306), None);
    }
}
