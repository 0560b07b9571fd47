//! DCS routing. DECSIXEL (`DCS P1;P2;P3 q`) is the only implemented
//! consumer; every other DCS body is collected into the void.

use crate::{sixel_ops, DcsConsumer, Term};
use core_vt::Params;

pub(crate) fn hook(term: &mut Term, params: &Params, intermediates: &[u8], final_byte: u8) {
    match (intermediates, final_byte) {
        ([], b'q') => sixel_ops::hook(term, params),
        (im, f) => {
            tracing::debug!(
                target: "term.dcs",
                intermediates = %String::from_utf8_lossy(im),
                final_byte = f as char as u32,
                "discarding unknown DCS"
            );
            term.dcs = DcsConsumer::Discard;
        }
    }
}

pub(crate) fn put(term: &mut Term, byte: u8) {
    match term.dcs {
        DcsConsumer::Sixel => term.sixel.put(byte),
        DcsConsumer::Discard => {}
        DcsConsumer::None => {
            // A stray put without a hook: parser state was aborted.
            tracing::trace!(target: "term.dcs", byte, "put without hook");
        }
    }
}

pub(crate) fn unhook(term: &mut Term) {
    match std::mem::take(&mut term.dcs) {
        DcsConsumer::Sixel => sixel_ops::unhook(term),
        DcsConsumer::Discard | DcsConsumer::None => {}
    }
}

#[cfg(test)]
mod tests {
    use crate::test_util::*;
    use crate::Term;

    #[test]
    fn unknown_dcs_swallowed() {
        let mut t = Term::new(10, 2, 0);
        feed(&mut t, b"\x1bP1$tsome-decrqss-body\x1b\\X");
        assert_eq!(screen_text(&t)[0], "X");
        assert!(t.grid().sixels.is_empty());
    }

    #[test]
    fn sixel_dcs_reaches_decoder() {
        let mut t = Term::new(10, 4, 4);
        t.set_cell_metrics(2, 6);
        feed(&mut t, b"\x1bPq#1~~\x1b\\");
        assert_eq!(t.grid().sixels.len(), 1);
    }
}
