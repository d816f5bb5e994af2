use decoder::endpoint::Endpoint;

/// One captured TCP segment handed from the acquisition layer to the
/// decoder: `(src_ip, src_port, dst_ip, dst_port, tcp_payload, timestamp)`.
#[derive(Debug, Clone)]
pub struct Segment {
    pub src: Endpoint,
    pub dst: Endpoint,
    pub payload: Vec<u8>,
    pub timestamp_micros: i64,
}
