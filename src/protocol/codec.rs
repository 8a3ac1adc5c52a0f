//! Packet encoding and decoding. Pure functions, no I/O.
//!
//! # Frame format
//!
//! ```text
//! +-----------+-------------+------------------+
//! | type (1)  | length (2)  | body (length)    |
//! +-----------+-------------+------------------+
//!               u16 big-endian, 0..=511
//! ```
//!
//! # Bodies
//!
//! | Packet        | Body                                              |
//! |---------------|---------------------------------------------------|
//! | `ClientHello` | magic, u32 big-endian                             |
//! | `ServerHello` | magic, u32 big-endian                             |
//! | `ServerReady` | empty                                             |
//! | `ShipsReady`  | empty                                             |
//! | `BeginGame`   | role moving first (0 server, 1 client)            |
//! | `Move`        | row, col (each 0..=9)                             |
//! | `MoveResult`  | result (0 hit, 1 miss, 2 sink), win flag          |
//! |               | + for sinks: kind, row, col, orientation, length  |
//! | `EndGame`     | winning role                                      |
//! | `Disconnect`  | UTF-8 reason, unterminated                        |
//!
//! A hit or miss result is always 2 bytes and a sink always 7, so every
//! result code has exactly one legal body length.

use alloc::string::String;
use alloc::vec::Vec;

use super::{
    MoveResult, Packet, PacketHeader, PacketType, PeerRole, ProtocolError, HEADER_LEN, MAGIC,
    MAX_BODY_LEN,
};
use crate::core::common::ShotOutcome;
use crate::core::config::BOARD_SIZE;
use crate::core::ship::{Orientation, PlacedShip, ShipKind};

const RESULT_HIT: u8 = 0;
const RESULT_MISS: u8 = 1;
const RESULT_SINK: u8 = 2;

const PLAIN_RESULT_LEN: usize = 2;
const SINK_RESULT_LEN: usize = 7;

/// Longest prefix of `reason` that fits in a disconnect body, cut on a
/// character boundary.
pub fn truncate_reason(reason: &str) -> &str {
    if reason.len() <= MAX_BODY_LEN {
        return reason;
    }
    let mut end = MAX_BODY_LEN;
    while !reason.is_char_boundary(end) {
        end -= 1;
    }
    &reason[..end]
}

/// Encode `packet` as one complete frame.
pub fn encode(packet: &Packet) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + 8);
    buf.push(packet.packet_type() as u8);
    buf.extend_from_slice(&[0, 0]);

    match packet {
        Packet::ClientHello | Packet::ServerHello => buf.extend_from_slice(&MAGIC.to_be_bytes()),
        Packet::ServerReady | Packet::ShipsReady => {}
        Packet::BeginGame { first } => buf.push(first.code()),
        Packet::Move { row, col } => buf.extend_from_slice(&[*row, *col]),
        Packet::MoveResult(result) => encode_move_result(&mut buf, result),
        Packet::EndGame { winner } => buf.push(winner.code()),
        Packet::Disconnect { reason } => {
            buf.extend_from_slice(truncate_reason(reason).as_bytes())
        }
    }

    let length = (buf.len() - HEADER_LEN) as u16;
    buf[1..HEADER_LEN].copy_from_slice(&length.to_be_bytes());
    buf
}

fn encode_move_result(buf: &mut Vec<u8>, result: &MoveResult) {
    let code = match result.outcome {
        ShotOutcome::Hit => RESULT_HIT,
        ShotOutcome::Miss => RESULT_MISS,
        ShotOutcome::Sink(_) => RESULT_SINK,
    };
    buf.push(code);
    buf.push(u8::from(result.win));
    if let ShotOutcome::Sink(ship) = result.outcome {
        buf.extend_from_slice(&[
            ship.kind.index() as u8,
            ship.row as u8,
            ship.col as u8,
            ship.orientation.code(),
            ship.length as u8,
        ]);
    }
}

/// Decode a frame header. `bytes` must hold at least [`HEADER_LEN`] bytes;
/// anything past the header is ignored.
pub fn decode_header(bytes: &[u8]) -> Result<PacketHeader, ProtocolError> {
    if bytes.len() < HEADER_LEN {
        return Err(ProtocolError::MalformedHeader {
            received: bytes.len(),
        });
    }
    let length = u16::from_be_bytes([bytes[1], bytes[2]]);
    if length as usize > MAX_BODY_LEN {
        return Err(ProtocolError::OversizedBody {
            length: length as usize,
            max: MAX_BODY_LEN,
        });
    }
    let packet_type = PacketType::try_from(bytes[0])?;
    Ok(PacketHeader {
        packet_type,
        length,
    })
}

/// Decode one complete frame: header plus exactly the body it announces.
pub fn decode(frame: &[u8]) -> Result<Packet, ProtocolError> {
    let header = decode_header(frame)?;
    let body = &frame[HEADER_LEN..];
    let expected = header.length as usize;
    if body.len() < expected {
        return Err(ProtocolError::TruncatedBody {
            received: body.len(),
            expected,
        });
    }
    if body.len() > expected {
        return Err(ProtocolError::WrongBodyLength {
            packet: header.packet_type,
            expected,
            actual: body.len(),
        });
    }
    decode_body(header, body)
}

fn expect_len(header: PacketHeader, expected: usize) -> Result<(), ProtocolError> {
    if header.length as usize != expected {
        return Err(ProtocolError::WrongBodyLength {
            packet: header.packet_type,
            expected,
            actual: header.length as usize,
        });
    }
    Ok(())
}

fn coordinate(field: &'static str, value: u8) -> Result<u8, ProtocolError> {
    if value >= BOARD_SIZE {
        return Err(ProtocolError::InvalidField {
            field,
            value: value as u32,
        });
    }
    Ok(value)
}

fn role(field: &'static str, value: u8) -> Result<PeerRole, ProtocolError> {
    PeerRole::from_code(value).ok_or(ProtocolError::InvalidField {
        field,
        value: value as u32,
    })
}

fn magic(body: &[u8]) -> Result<(), ProtocolError> {
    let value = u32::from_be_bytes([body[0], body[1], body[2], body[3]]);
    if value != MAGIC {
        return Err(ProtocolError::InvalidField {
            field: "magic",
            value,
        });
    }
    Ok(())
}

/// Decode a body whose length has already been read from `header`.
///
/// `body` must be exactly `header.length` bytes long.
pub fn decode_body(header: PacketHeader, body: &[u8]) -> Result<Packet, ProtocolError> {
    if body.len() != header.length as usize {
        return Err(ProtocolError::TruncatedBody {
            received: body.len(),
            expected: header.length as usize,
        });
    }

    match header.packet_type {
        PacketType::ClientHello => {
            expect_len(header, 4)?;
            magic(body)?;
            Ok(Packet::ClientHello)
        }
        PacketType::ServerHello => {
            expect_len(header, 4)?;
            magic(body)?;
            Ok(Packet::ServerHello)
        }
        PacketType::ServerReady => {
            expect_len(header, 0)?;
            Ok(Packet::ServerReady)
        }
        PacketType::ShipsReady => {
            expect_len(header, 0)?;
            Ok(Packet::ShipsReady)
        }
        PacketType::BeginGame => {
            expect_len(header, 1)?;
            Ok(Packet::BeginGame {
                first: role("first", body[0])?,
            })
        }
        PacketType::Move => {
            expect_len(header, 2)?;
            Ok(Packet::Move {
                row: coordinate("row", body[0])?,
                col: coordinate("col", body[1])?,
            })
        }
        PacketType::MoveResult => decode_move_result(header, body).map(Packet::MoveResult),
        PacketType::EndGame => {
            expect_len(header, 1)?;
            Ok(Packet::EndGame {
                winner: role("winner", body[0])?,
            })
        }
        PacketType::Disconnect => Ok(Packet::Disconnect {
            reason: String::from_utf8_lossy(body).into_owned(),
        }),
    }
}

fn decode_move_result(header: PacketHeader, body: &[u8]) -> Result<MoveResult, ProtocolError> {
    let Some(&code) = body.first() else {
        return Err(ProtocolError::WrongBodyLength {
            packet: header.packet_type,
            expected: PLAIN_RESULT_LEN,
            actual: 0,
        });
    };
    let expected = match code {
        RESULT_HIT | RESULT_MISS => PLAIN_RESULT_LEN,
        RESULT_SINK => SINK_RESULT_LEN,
        other => {
            return Err(ProtocolError::InvalidField {
                field: "result",
                value: other as u32,
            })
        }
    };
    expect_len(header, expected)?;

    let win = match body[1] {
        0 => false,
        1 => true,
        other => {
            return Err(ProtocolError::InvalidField {
                field: "win",
                value: other as u32,
            })
        }
    };

    let outcome = match code {
        RESULT_HIT => ShotOutcome::Hit,
        RESULT_MISS => ShotOutcome::Miss,
        _ => ShotOutcome::Sink(decode_sunk_ship(&body[2..])?),
    };
    if win && !matches!(outcome, ShotOutcome::Sink(_)) {
        return Err(ProtocolError::InvalidField {
            field: "win",
            value: 1,
        });
    }
    Ok(MoveResult { outcome, win })
}

fn decode_sunk_ship(fields: &[u8]) -> Result<PlacedShip, ProtocolError> {
    let kind = ShipKind::from_index(fields[0] as usize).ok_or(ProtocolError::InvalidField {
        field: "ship",
        value: fields[0] as u32,
    })?;
    let row = coordinate("row", fields[1])? as usize;
    let col = coordinate("col", fields[2])? as usize;
    let orientation = Orientation::from_code(fields[3]).ok_or(ProtocolError::InvalidField {
        field: "orientation",
        value: fields[3] as u32,
    })?;
    let length = fields[4] as usize;
    if length != kind.length() {
        return Err(ProtocolError::InvalidField {
            field: "length",
            value: length as u32,
        });
    }
    let (end_row, end_col) = orientation.step(row, col, length - 1);
    if end_row >= BOARD_SIZE as usize || end_col >= BOARD_SIZE as usize {
        return Err(ProtocolError::InvalidField {
            field: "origin",
            value: (row * BOARD_SIZE as usize + col) as u32,
        });
    }
    Ok(PlacedShip {
        kind,
        row,
        col,
        orientation,
        length,
        remaining: 0,
    })
}
