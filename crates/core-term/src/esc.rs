//! Plain ESC dispatch (no CSI/OSC/DCS introducer).

use crate::{scroll, Term};

pub(crate) fn dispatch(term: &mut Term, intermediates: &[u8], final_byte: u8) {
    match (intermediates, final_byte) {
        ([], b'7') => term.save_cursor(),    // DECSC
        ([], b'8') => term.restore_cursor(), // DECRC
        ([], b'D') => term.linefeed(),       // IND
        ([], b'E') => {
            term.linefeed();                 // NEL
            term.carriage_return();
        }
        ([], b'H') => term.set_tab_stop(),   // HTS
        ([], b'M') => term.reverse_index(),  // RI
        ([], b'N') => term.charsets.single_shift = Some(2), // SS2
        ([], b'O') => term.charsets.single_shift = Some(3), // SS3
        ([], b'Z') => term.reply(b"\x1b[?62;4;22c"), // DECID
        ([], b'c') => term.reset(true),      // RIS
        ([], b'=') => term.modes.keypad_application = true,  // DECKPAM
        ([], b'>') => term.modes.keypad_application = false, // DECKPNM
        ([], b'\\') => {} // ST terminating a string; the string already dispatched

        // Charset designation: ( ) * + select G0-G3.
        ([b'('], f) => term.charsets.designate(0, f),
        ([b')'], f) => term.charsets.designate(1, f),
        ([b'*'], f) => term.charsets.designate(2, f),
        ([b'+'], f) => term.charsets.designate(3, f),

        ([b'#'], b'8') => scroll::screen_alignment(term), // DECALN

        (im, f) => {
            tracing::debug!(
                target: "term.esc",
                intermediates = %String::from_utf8_lossy(im),
                final_byte = f as char as u32,
                "unimplemented ESC final"
            );
        }
    }
}
