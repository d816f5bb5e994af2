pub mod interface;
pub mod segment;

pub use interface::discover_loopback_interface;
pub use segment::Segment;

use common::err::decode_error::ReError;
use common::err::CResult;
use decoder::endpoint::Endpoint;
use etherparse::{InternetSlice, SlicedPacket, TransportSlice};

/// Live capture over a pcap-accessible adapter, filtered to one TCP port.
/// The capture thread calls [`CaptureHandle::next_segment`] in a loop and
/// hands each result straight to the decoder — this type does no decoding
/// of its own.
pub struct CaptureHandle {
    capture: pcap::Capture<pcap::Active>,
}

impl CaptureHandle {
    pub fn open(interface: Option<&str>, port: u16) -> CResult<Self> {
        let device_name = match interface {
            Some(name) => name.to_string(),
            None => discover_loopback_interface()
                .ok_or_else(|| ReError::CaptureError("no loopback adapter found".to_string()))?,
        };

        let mut capture = pcap::Capture::from_device(device_name.as_str())
            .map_err(|e| ReError::CaptureError(format!("open device {device_name}: {e}")))?
            .promisc(false)
            .snaplen(65535)
            .timeout(1000)
            .open()
            .map_err(|e| ReError::CaptureError(format!("activate device {device_name}: {e}")))?;

        let filter = format!("tcp port {port}");
        capture
            .filter(&filter, true)
            .map_err(|e| ReError::CaptureError(format!("apply filter '{filter}': {e}")))?;

        Ok(CaptureHandle { capture })
    }

    /// Blocks for the next captured frame and, if it's a TCP/IP segment with
    /// a non-empty payload, returns the parsed [`Segment`]. Frames that
    /// don't parse as Ethernet/IP/TCP (ARP, IPv6 neighbor discovery, etc.)
    /// are skipped rather than treated as an error.
    pub fn next_segment(&mut self) -> CResult<Option<Segment>> {
        let packet = self
            .capture
            .next_packet()
            .map_err(|e| ReError::CaptureError(format!("read packet: {e}")))?;

        Ok(parse_segment(packet.data, packet.header.ts.tv_sec as i64, packet.header.ts.tv_usec as i64))
    }
}

fn parse_segment(data: &[u8], ts_sec: i64, ts_usec: i64) -> Option<Segment> {
    let sliced = SlicedPacket::from_ethernet(data).ok()?;

    let (src_ip, dst_ip) = match sliced.ip? {
        InternetSlice::Ipv4(ip, _) => (
            std::net::IpAddr::from(ip.source_addr()),
            std::net::IpAddr::from(ip.destination_addr()),
        ),
        InternetSlice::Ipv6(ip, _) => (
            std::net::IpAddr::from(ip.source_addr()),
            std::net::IpAddr::from(ip.destination_addr()),
        ),
    };

    let tcp = match sliced.transport? {
        TransportSlice::Tcp(tcp) => tcp,
        _ => return None,
    };

    if sliced.payload.is_empty() {
        return None;
    }

    Some(Segment {
        src: Endpoint::new(src_ip, tcp.source_port()),
        dst: Endpoint::new(dst_ip, tcp.destination_port()),
        payload: sliced.payload.to_vec(),
        timestamp_micros: ts_sec * 1_000_000 + ts_usec,
    })
}
