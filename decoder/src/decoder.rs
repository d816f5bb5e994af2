use byteorder::{ByteOrder, LittleEndian};
use common::time_util::now_str_micros;

use crate::codec::{lenenc_int, lenenc_str, decode_binary_row_or_params, BitmapKind, Value};
use crate::endpoint::{client_key, Endpoint};
use crate::event::{Event, EventKind};
use crate::session::{Command, Session, SessionState, SessionTable};
use crate::statement::StatementRegistry;
use crate::wire::WireReader;

pub const COM_QUERY: u8 = 0x03;
pub const COM_STMT_PREPARE: u8 = 0x16;
pub const COM_STMT_EXECUTE: u8 = 0x17;
pub const COM_STMT_CLOSE: u8 = 0x19;

const EOF_MARKER: u8 = 0xFE;
const OK_MARKER: u8 = 0x00;
const ERR_MARKER: u8 = 0xFF;

fn is_eof_packet(body: &[u8]) -> bool {
    !body.is_empty() && body[0] == EOF_MARKER && body.len() < 9
}

/// Consumes client- and server-direction packets, drives per-session state
/// transitions, and emits structured events. Confined to a single thread —
/// `SessionTable` and `StatementRegistry` are not locked against concurrent
/// decoders; parallelizing would require partitioning both by flow hash.
pub struct Decoder {
    sessions: SessionTable,
    statements: StatementRegistry,
    mysql_port: u16,
}

impl Decoder {
    pub fn new(session_cap: usize, mysql_port: u16) -> Self {
        Decoder {
            sessions: SessionTable::new(session_cap),
            statements: StatementRegistry::new(),
            mysql_port,
        }
    }

    pub fn statements(&self) -> &StatementRegistry {
        &self.statements
    }

    pub fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    /// Frames and decodes every MySQL packet in one captured TCP payload,
    /// returning the events produced in order. Non-blocking: every byte
    /// access is bounds-checked and a malformed packet degrades to a
    /// sentinel value rather than stalling or panicking.
    pub fn decode_payload(&self, src: Endpoint, dst: Endpoint, payload: &[u8]) -> Vec<Event> {
        let Some(key) = client_key(src, dst, self.mysql_port) else {
            return Vec::new();
        };
        let to_server = dst.port == self.mysql_port;
        let (mut session, evicted) = self.sessions.get_or_insert(key);
        self.destroy_evicted_statements(evicted);
        let mut events = Vec::new();

        for packet in WireReader::new(payload) {
            if packet.body.is_empty() && packet.length == 0 {
                continue;
            }
            if to_server {
                if let Some(event) = self.handle_to_server(&mut session, src, dst, packet.body) {
                    events.push(event);
                }
            } else if let Some(event) = self.handle_from_server(&mut session, src, dst, packet.body) {
                events.push(event);
            }
        }

        let evicted = self.sessions.put(key, session);
        self.destroy_evicted_statements(evicted);
        events
    }

    /// A session evicted from `SessionTable` to stay within `session_cap`
    /// takes every `PreparedStatement` it registered with it, per the data
    /// model's "destroyed ... when the owning session is evicted" rule.
    fn destroy_evicted_statements(&self, evicted: Option<(crate::endpoint::ClientKey, Session)>) {
        if let Some((_, session)) = evicted {
            for stmt_id in session.owned_stmt_ids {
                self.statements.remove(stmt_id);
            }
        }
    }

    fn mint_tx_id(&self) -> String {
        let id = common::uuid::uuid_timestamp();
        id.chars().take(8).collect()
    }

    fn handle_to_server(
        &self,
        session: &mut Session,
        src: Endpoint,
        dst: Endpoint,
        body: &[u8],
    ) -> Option<Event> {
        if body.is_empty() {
            return None;
        }
        let cmd_code = body[0];
        let tx_id = self.mint_tx_id();

        match cmd_code {
            COM_QUERY => {
                session.reset_for_new_command(Command::Query, tx_id.clone());
                let text = String::from_utf8_lossy(&body[1..]).into_owned();
                session.state = SessionState::AwaitingResultset;
                session.query = Some(text.clone());
                let mut event = Event::new(now_str_micros(), src, dst, tx_id, EventKind::Query);
                event.full_query = Some(text);
                Some(event)
            }
            COM_STMT_PREPARE => {
                session.reset_for_new_command(Command::StmtPrepare, tx_id.clone());
                let text = String::from_utf8_lossy(&body[1..]).into_owned();
                session.pending_prepare = Some(text.clone());
                // The PREPARE_OK dispatch lives under the AWAITING_RESULTSET
                // branch, so a pending prepare has to park the session there.
                session.state = SessionState::AwaitingResultset;
                let mut event = Event::new(now_str_micros(), src, dst, tx_id, EventKind::Prepare);
                event.full_query = Some(text);
                Some(event)
            }
            COM_STMT_EXECUTE => {
                session.reset_for_new_command(Command::StmtExecute, tx_id.clone());
                if body.len() < 10 {
                    return None;
                }
                let stmt_id = LittleEndian::read_u32(&body[1..5]);
                session.stmt_id = Some(stmt_id);
                session.state = SessionState::AwaitingResultset;

                let mut event = Event::new(now_str_micros(), src, dst, tx_id, EventKind::Execute);
                match self.statements.lookup(stmt_id) {
                    Some(stmt) => {
                        let mut type_tags = stmt.col_types.clone();
                        let values = decode_binary_row_or_params(
                            body,
                            10,
                            stmt.num_params,
                            &mut type_tags,
                            BitmapKind::Params,
                        );
                        self.statements.set_param_types(stmt_id, type_tags);
                        session.query = Some(stmt.query_text.clone());
                        event.query = Some(stmt.query_text);
                        event.params = Some(values);
                    }
                    None => {
                        event.unknown_stmt = Some(true);
                    }
                }
                Some(event)
            }
            COM_STMT_CLOSE => {
                session.reset_for_new_command(Command::StmtClose, tx_id.clone());
                if body.len() < 5 {
                    return None;
                }
                let stmt_id = LittleEndian::read_u32(&body[1..5]);
                self.statements.remove(stmt_id);
                Some(Event::new(now_str_micros(), src, dst, tx_id, EventKind::Close))
            }
            other => {
                session.reset_for_new_command(Command::Other(other), tx_id.clone());
                Some(Event::new(now_str_micros(), src, dst, tx_id, EventKind::Cmd))
            }
        }
    }

    fn handle_from_server(
        &self,
        session: &mut Session,
        src: Endpoint,
        dst: Endpoint,
        body: &[u8],
    ) -> Option<Event> {
        match session.state {
            SessionState::Idle => None,
            SessionState::AwaitingResultset => self.handle_awaiting_resultset(session, src, dst, body),
            SessionState::ReadingColumns => self.handle_reading_columns(session, src, dst, body),
            SessionState::ReadingRows => self.handle_reading_rows(session, src, dst, body),
        }
    }

    fn handle_awaiting_resultset(
        &self,
        session: &mut Session,
        src: Endpoint,
        dst: Endpoint,
        body: &[u8],
    ) -> Option<Event> {
        if body.is_empty() {
            return None;
        }

        if body[0] == OK_MARKER && session.pending_prepare.is_some() && body.len() >= 9 {
            let query_text = session.pending_prepare.take().unwrap();
            let stmt_id = LittleEndian::read_u32(&body[1..5]);
            let num_params = LittleEndian::read_u16(&body[7..9]) as usize;
            self.statements.register(stmt_id, query_text, num_params);
            session.owned_stmt_ids.push(stmt_id);
            session.skipping_prepare_ok_tail = true;
            session.state = SessionState::ReadingColumns;
            return Some(Event::new(
                now_str_micros(),
                src,
                dst,
                session.tx_id.clone(),
                EventKind::PrepareOk,
            ));
        }

        // A single `0x00` byte is exactly the lenenc encoding of a column
        // count of zero, so it's only read as an OK packet's status flag
        // when the body carries the rest of an OK packet's fields too.
        if body[0] == OK_MARKER && body.len() > 1 {
            session.to_idle();
            return None;
        }

        if body[0] == ERR_MARKER {
            session.pending_prepare = None;
            session.to_idle();
            return None;
        }

        let (col_count, size) = lenenc_int(body, 0);
        if size == 0 {
            session.to_idle();
            return None;
        }
        session.col_count = col_count as usize;
        session.cols_received = 0;
        session.col_types.clear();
        session.state = SessionState::ReadingColumns;
        None
    }

    fn handle_reading_columns(
        &self,
        session: &mut Session,
        _src: Endpoint,
        _dst: Endpoint,
        body: &[u8],
    ) -> Option<Event> {
        if session.skipping_prepare_ok_tail {
            if is_eof_packet(body) {
                session.skipping_prepare_ok_tail = false;
                session.to_idle();
            }
            return None;
        }

        if is_eof_packet(body) {
            if session.col_count == 0 {
                session.to_idle();
            } else {
                session.state = SessionState::ReadingRows;
            }
            return None;
        }

        let mut off = 0;
        for _ in 0..6 {
            let (_s, size) = lenenc_str(body, off);
            if size == 0 {
                return None;
            }
            off += size;
        }
        if off + 1 + 2 + 4 + 1 > body.len() {
            return None;
        }
        off += 1; // filler
        off += 2; // charset
        off += 4; // column length
        let col_type = body[off];
        session.col_types.push(col_type);
        session.cols_received += 1;
        None
    }

    fn handle_reading_rows(
        &self,
        session: &mut Session,
        src: Endpoint,
        dst: Endpoint,
        body: &[u8],
    ) -> Option<Event> {
        if is_eof_packet(body) {
            session.to_idle();
            return None;
        }

        let is_binary = session.cmd == Some(Command::StmtExecute)
            && !body.is_empty()
            && body[0] == OK_MARKER;

        let values: Vec<Value> = if is_binary {
            let mut type_tags = session.col_types.clone();
            decode_binary_row_or_params(
                body,
                0,
                session.col_count,
                &mut type_tags,
                BitmapKind::Row,
            )
        } else {
            let mut off = 0;
            let mut values = Vec::with_capacity(session.col_count);
            for _ in 0..session.col_count {
                let (s, size) = lenenc_str(body, off);
                if size == 0 {
                    values.push(Value::Error);
                    break;
                }
                off += size;
                values.push(s.map(Value::Str).unwrap_or(Value::Null));
            }
            values
        };

        let mut event = Event::new(now_str_micros(), src, dst, session.tx_id.clone(), EventKind::Row);
        event.rows = Some(values);
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    fn client() -> Endpoint {
        Endpoint::new("127.0.0.1".parse::<IpAddr>().unwrap(), 55000)
    }

    fn server() -> Endpoint {
        Endpoint::new("127.0.0.1".parse::<IpAddr>().unwrap(), 3306)
    }

    fn framed(body: &[u8]) -> Vec<u8> {
        let mut out = vec![];
        let len = body.len() as u32;
        out.extend_from_slice(&len.to_le_bytes()[..3]);
        out.push(0);
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn simple_query_emits_query_event() {
        let decoder = Decoder::new(100, 3306);
        let mut body = vec![COM_QUERY];
        body.extend_from_slice(b"SELECT 1");
        let payload = framed(&body);

        let events = decoder.decode_payload(client(), server(), &payload);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Query);
        assert_eq!(events[0].full_query.as_deref(), Some("SELECT 1"));
    }

    #[test]
    fn prepare_then_prepare_ok_then_execute() {
        let decoder = Decoder::new(100, 3306);

        let mut prepare_body = vec![COM_STMT_PREPARE];
        prepare_body.extend_from_slice(b"INSERT INTO tb_order VALUES (?)");
        let prepare_payload = framed(&prepare_body);
        let events = decoder.decode_payload(client(), server(), &prepare_payload);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Prepare);

        // PREPARE_OK: stmt_id=1, num_params=1
        let mut ok_body = vec![0x00];
        ok_body.extend_from_slice(&1u32.to_le_bytes()); // stmt_id
        ok_body.push(0x00); // num_columns lo
        ok_body.push(0x00); // num_columns hi
        ok_body.push(0x00); // filler
        ok_body.extend_from_slice(&1u16.to_le_bytes()); // num_params
        let ok_payload = framed(&ok_body);
        let events = decoder.decode_payload(server(), client(), &ok_payload);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::PrepareOk);

        // the trailing param-definition EOF the real server would send next
        let eof_payload = framed(&[0xFE, 0x00, 0x00]);
        let events = decoder.decode_payload(server(), client(), &eof_payload);
        assert!(events.is_empty());

        // EXECUTE: stmt_id=1, one LONG param = 10
        let mut exec_body = vec![COM_STMT_EXECUTE];
        exec_body.extend_from_slice(&1u32.to_le_bytes()); // stmt_id
        exec_body.push(0x00); // flags
        exec_body.extend_from_slice(&1u32.to_le_bytes()); // iteration count
        exec_body.push(0x00); // null bitmap, 1 param -> 1 byte, no nulls
        exec_body.push(0x01); // new-params-bound
        exec_body.push(0x03); // type: LONG
        exec_body.push(0x00); // unsigned flag
        exec_body.extend_from_slice(&10i32.to_le_bytes());
        let exec_payload = framed(&exec_body);
        let events = decoder.decode_payload(client(), server(), &exec_payload);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Execute);
        assert_eq!(events[0].params, Some(vec![Value::Int(10)]));
        assert_eq!(events[0].query.as_deref(), Some("INSERT INTO tb_order VALUES (?)"));
    }

    #[test]
    fn execute_against_unknown_statement_is_flagged() {
        let decoder = Decoder::new(100, 3306);
        let mut query_body = vec![COM_QUERY];
        query_body.extend_from_slice(b"x");
        // force the session to exist and move past IDLE once, harmless here
        let _ = decoder.decode_payload(client(), server(), &framed(&query_body));

        let mut exec_body = vec![COM_STMT_EXECUTE];
        exec_body.extend_from_slice(&999u32.to_le_bytes());
        exec_body.push(0x00);
        exec_body.extend_from_slice(&1u32.to_le_bytes());
        let events = decoder.decode_payload(client(), server(), &framed(&exec_body));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].unknown_stmt, Some(true));
        assert!(events[0].params.is_none());
    }

    #[test]
    fn text_result_set_round_trip() {
        let decoder = Decoder::new(100, 3306);
        let mut query_body = vec![COM_QUERY];
        query_body.extend_from_slice(b"SELECT 'Hell'");
        let _ = decoder.decode_payload(client(), server(), &framed(&query_body));

        // column count = 1
        let events = decoder.decode_payload(server(), client(), &framed(&[0x01]));
        assert!(events.is_empty());

        // one ColumnDefinition41 packet: six empty lenenc strings + filler + charset(2) + len(4) + type(1)
        let mut col_def = vec![];
        for _ in 0..6 {
            col_def.push(0x00); // empty lenenc string
        }
        col_def.push(0x00); // filler
        col_def.extend_from_slice(&[0x21, 0x00]); // charset
        col_def.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // column length
        col_def.push(0xFD); // VAR_STRING
        col_def.push(0x00); // decimals/flags padding, ignored by this parser
        let events = decoder.decode_payload(server(), client(), &framed(&col_def));
        assert!(events.is_empty());

        // EOF ends column phase
        let events = decoder.decode_payload(server(), client(), &framed(&[0xFE, 0x00, 0x00]));
        assert!(events.is_empty());

        // one text row: lenenc 4 "Hell"
        let mut row = vec![0x04];
        row.extend_from_slice(b"Hell");
        let events = decoder.decode_payload(server(), client(), &framed(&row));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Row);
        assert_eq!(events[0].rows, Some(vec![Value::Str("Hell".to_string())]));

        // EOF ends row phase, session returns to idle
        let events = decoder.decode_payload(server(), client(), &framed(&[0xFE, 0x00, 0x00]));
        assert!(events.is_empty());
    }

    #[test]
    fn zero_length_packet_is_a_no_op() {
        let decoder = Decoder::new(100, 3306);
        let events = decoder.decode_payload(client(), server(), &framed(&[]));
        assert!(events.is_empty());
    }

    #[test]
    fn two_packets_in_one_payload_yield_two_events_in_order() {
        let decoder = Decoder::new(100, 3306);
        let mut payload = vec![];
        let mut q1 = vec![COM_QUERY];
        q1.extend_from_slice(b"SELECT 1");
        let mut q2 = vec![COM_QUERY];
        q2.extend_from_slice(b"SELECT 2");
        payload.extend_from_slice(&framed(&q1));
        payload.extend_from_slice(&framed(&q2));

        let events = decoder.decode_payload(client(), server(), &payload);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].full_query.as_deref(), Some("SELECT 1"));
        assert_eq!(events[1].full_query.as_deref(), Some("SELECT 2"));
    }

    #[test]
    fn eof_with_zero_columns_goes_straight_to_idle() {
        let decoder = Decoder::new(100, 3306);
        let mut q = vec![COM_QUERY];
        q.extend_from_slice(b"UPDATE t SET x=1");
        let _ = decoder.decode_payload(client(), server(), &framed(&q));

        // column count = 0
        let _ = decoder.decode_payload(server(), client(), &framed(&[0x00]));
        // EOF immediately, no columns were ever read
        let events = decoder.decode_payload(server(), client(), &framed(&[0xFE, 0x00, 0x00]));
        assert!(events.is_empty());

        let key = client_key(client(), server(), 3306).unwrap();
        let (session, _evicted) = decoder.sessions().get_or_insert(key);
        assert_eq!(session.state, SessionState::Idle);
    }
}
