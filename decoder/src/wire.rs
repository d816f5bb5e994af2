use byteorder::{ByteOrder, LittleEndian};

/// Size of the MySQL packet header: 3-byte little-endian length, 1-byte sequence id.
pub const PACKET_HEADER_SIZE: usize = 4;

/// One framed MySQL packet, borrowing its body from the originating TCP payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MySQLPacket<'a> {
    pub length: u32,
    pub sequence_id: u8,
    pub body: &'a [u8],
}

/// Frames consecutive MySQL packets out of a contiguous byte slice.
///
/// A single TCP payload may hold several packets back to back, or a packet
/// truncated at the end of the slice. `next` yields packets in order and
/// returns `None` once what remains can't be framed as a complete packet —
/// callers drop the remainder rather than waiting for more bytes, since
/// segments are assumed in-order and complete on loopback.
pub struct WireReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        WireReader { data, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    fn next_packet(&mut self) -> Option<MySQLPacket<'a>> {
        let o = self.offset;
        if o + PACKET_HEADER_SIZE > self.data.len() {
            return None;
        }
        let length = LittleEndian::read_u24(&self.data[o..o + 3]);
        let sequence_id = self.data[o + 3];
        let body_start = o + PACKET_HEADER_SIZE;
        let body_end = body_start + length as usize;
        if body_end > self.data.len() {
            return None;
        }
        self.offset = body_end;
        Some(MySQLPacket {
            length,
            sequence_id,
            body: &self.data[body_start..body_end],
        })
    }
}

impl<'a> Iterator for WireReader<'a> {
    type Item = MySQLPacket<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_packet()
    }
}
