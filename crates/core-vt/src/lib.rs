//! Byte-stream → control-event parser (VT500 state machine + UTF-8).
//!
//! The parser is a pure push machine: [`Parser::advance`] consumes a
//! byte slice and surfaces semantic events through a [`Perform`]
//! implementation. It performs no I/O, never fails, and accepts every
//! possible byte in every state.
//!
//! Invariants:
//! * Each byte is examined at most twice (once when a malformed UTF-8
//!   sequence aborts and re-runs the byte through `Ground`).
//! * Collected state (params, intermediates, OSC buffer) is cleared on
//!   entry to `Escape`, `CsiEntry` and `DcsEntry`.
//! * Exit actions fire on every path out of a collecting state,
//!   including aborts via CAN/SUB and the anywhere C1 bytes: leaving
//!   `OscString` dispatches the OSC, leaving `DcsPassthrough` unhooks.
//! * UTF-8 decoding rejects surrogate halves and over-long encodings;
//!   rejected sequences are dropped without consuming the byte that
//!   exposed them.

pub mod params;
pub mod table;

pub use params::{Param, Params};
pub use table::{Action, State};

use table::Transition;

/// Receiver of parsed events. The parser owns nothing downstream; the
/// semantics layer implements this trait and mutates its own state.
pub trait Perform {
    /// A decoded printable codepoint (ASCII fast path included).
    fn print(&mut self, c: char);
    /// A C0 or C1 control.
    fn execute(&mut self, byte: u8);
    /// Final byte of an ESC sequence (no CSI/OSC/DCS introducer).
    fn esc_dispatch(&mut self, intermediates: &[u8], final_byte: u8);
    /// Final byte of a CSI sequence.
    fn csi_dispatch(&mut self, params: &Params, intermediates: &[u8], final_byte: u8);
    /// A complete OSC payload (`Ps ; Pt`, undecoded).
    fn osc_dispatch(&mut self, payload: &[u8], bell_terminated: bool);
    /// DCS introducer seen; the passthrough body follows via `put`.
    fn hook(&mut self, params: &Params, intermediates: &[u8], final_byte: u8);
    /// One byte of DCS passthrough body.
    fn put(&mut self, byte: u8);
    /// DCS body finished (ST, or aborted).
    fn unhook(&mut self);
}

/// OSC payloads beyond this are truncated (a runaway OSC without a
/// terminator would otherwise buffer the entire stream). Large enough
/// for OSC 52 clipboard payloads.
const MAX_OSC: usize = 1024 * 1024;

const MAX_INTERMEDIATES: usize = 2;

#[derive(Debug, Default)]
struct Utf8Accum {
    bytes: [u8; 4],
    len: u8,
    remaining: u8,
}

/// The parser: current state plus all collected partial-sequence data.
#[derive(Debug)]
pub struct Parser {
    state: State,
    params: Params,
    intermediates: [u8; MAX_INTERMEDIATES],
    intermediate_idx: usize,
    /// Set when more intermediates arrived than we store; the sequence
    /// is then dispatched as unrecognized downstream.
    intermediate_overflow: bool,
    osc: Vec<u8>,
    osc_overflow: bool,
    utf8: Utf8Accum,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            state: State::Ground,
            params: Params::default(),
            intermediates: [0; MAX_INTERMEDIATES],
            intermediate_idx: 0,
            intermediate_overflow: false,
            osc: Vec::new(),
            osc_overflow: false,
            utf8: Utf8Accum::default(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Feed a chunk of PTY output.
    pub fn advance<P: Perform>(&mut self, perform: &mut P, bytes: &[u8]) {
        for &byte in bytes {
            self.advance_byte(perform, byte);
        }
    }

    fn advance_byte<P: Perform>(&mut self, perform: &mut P, byte: u8) {
        if self.state == State::Utf8Collect {
            self.utf8_collect(perform, byte);
            return;
        }

        let Transition { action, next } = table::anywhere(byte)
            .unwrap_or_else(|| table::lookup(self.state, byte));

        match next {
            Some(next) if next != self.state => {
                self.exit_state(perform, byte);
                self.do_action(perform, action, byte);
                self.enter_state(perform, next, byte);
            }
            _ => self.do_action(perform, action, byte),
        }
    }

    fn do_action<P: Perform>(&mut self, perform: &mut P, action: Action, byte: u8) {
        match action {
            Action::Ignore => {}
            Action::Execute => perform.execute(byte),
            Action::Print => perform.print(byte as char),
            Action::Param => self.params.push_byte(byte),
            Action::Collect => self.collect(byte),
            Action::EscDispatch => {
                perform.esc_dispatch(self.intermediates(), byte);
            }
            Action::CsiDispatch => {
                if self.intermediate_overflow {
                    tracing::debug!(
                        target: "vt.parser",
                        final_byte = byte as char as u32,
                        "csi with overflowing intermediates dropped"
                    );
                } else {
                    perform.csi_dispatch(&self.params, self.intermediates(), byte);
                }
            }
            Action::OscPut => {
                if self.osc.len() < MAX_OSC {
                    self.osc.push(byte);
                } else if !self.osc_overflow {
                    self.osc_overflow = true;
                    tracing::debug!(target: "vt.parser", "osc payload truncated");
                }
            }
            Action::Put => perform.put(byte),
            Action::Utf8Start2 => self.utf8_start(byte, 1),
            Action::Utf8Start3 => self.utf8_start(byte, 2),
            Action::Utf8Start4 => self.utf8_start(byte, 3),
        }
    }

    fn enter_state<P: Perform>(&mut self, perform: &mut P, next: State, byte: u8) {
        self.state = next;
        match next {
            State::Escape | State::CsiEntry | State::DcsEntry => self.clear(),
            State::OscString => {
                self.osc.clear();
                self.osc_overflow = false;
            }
            State::DcsPassthrough => {
                perform.hook(&self.params, self.intermediates(), byte);
            }
            _ => {}
        }
    }

    fn exit_state<P: Perform>(&mut self, perform: &mut P, byte: u8) {
        match self.state {
            State::OscString => {
                // BEL- vs ST-terminated is visible to OSC queries,
                // which must echo the sender's terminator.
                perform.osc_dispatch(&self.osc, byte == 0x07);
            }
            State::DcsPassthrough => perform.unhook(),
            _ => {}
        }
    }

    fn clear(&mut self) {
        self.params.clear();
        self.intermediate_idx = 0;
        self.intermediate_overflow = false;
    }

    fn collect(&mut self, byte: u8) {
        if self.intermediate_idx < MAX_INTERMEDIATES {
            self.intermediates[self.intermediate_idx] = byte;
            self.intermediate_idx += 1;
        } else {
            self.intermediate_overflow = true;
        }
    }

    fn intermediates(&self) -> &[u8] {
        &self.intermediates[..self.intermediate_idx]
    }

    // --- UTF-8 -------------------------------------------------------

    fn utf8_start(&mut self, byte: u8, continuations: u8) {
        self.utf8.bytes[0] = byte;
        self.utf8.len = 1;
        self.utf8.remaining = continuations;
    }

    fn utf8_collect<P: Perform>(&mut self, perform: &mut P, byte: u8) {
        if !(0x80..=0xbf).contains(&byte) {
            // Malformed: abandon the accumulator and re-run the byte
            // through Ground (it may start a new sequence or be a C0).
            tracing::trace!(
                target: "vt.parser",
                byte,
                "utf-8 sequence aborted by non-continuation byte"
            );
            self.state = State::Ground;
            self.utf8.remaining = 0;
            self.advance_byte(perform, byte);
            return;
        }

        self.utf8.bytes[self.utf8.len as usize] = byte;
        self.utf8.len += 1;
        self.utf8.remaining -= 1;

        if self.utf8.remaining == 0 {
            self.state = State::Ground;
            match decode_utf8(&self.utf8.bytes[..self.utf8.len as usize]) {
                Some(c) => perform.print(c),
                None => {
                    tracing::trace!(
                        target: "vt.parser",
                        bytes = ?&self.utf8.bytes[..self.utf8.len as usize],
                        "invalid utf-8 sequence dropped"
                    );
                }
            }
        }
    }
}

/// Decode a complete 2–4 byte sequence. Continuation-byte ranges were
/// already validated; this checks over-longs, surrogates, and the
/// Unicode ceiling per RFC 3629.
fn decode_utf8(bytes: &[u8]) -> Option<char> {
    let cp = match bytes.len() {
        2 => ((bytes[0] as u32 & 0x1f) << 6) | (bytes[1] as u32 & 0x3f),
        3 => {
            ((bytes[0] as u32 & 0x0f) << 12)
                | ((bytes[1] as u32 & 0x3f) << 6)
                | (bytes[2] as u32 & 0x3f)
        }
        4 => {
            ((bytes[0] as u32 & 0x07) << 18)
                | ((bytes[1] as u32 & 0x3f) << 12)
                | ((bytes[2] as u32 & 0x3f) << 6)
                | (bytes[3] as u32 & 0x3f)
        }
        _ => return None,
    };

    let min = match bytes.len() {
        2 => 0x80,
        3 => 0x800,
        _ => 0x10000,
    };
    if cp < min {
        return None; // over-long encoding
    }

    char::from_u32(cp) // rejects surrogates and > U+10FFFF
}
