//! In-process binding of the three logical channels (§4.1) onto
//! `crossbeam-channel`. This is one concrete transport for the
//! `Envelope` wire format; a real deployment could swap this module
//! for a socket-backed one without touching the roles themselves.

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::control::message::Envelope;

/// One end of a bidirectional link: send requests out, receive
/// replies in (or vice versa, depending on which end you hold).
pub struct Endpoint {
    pub tx: Sender<Envelope>,
    pub rx: Receiver<Envelope>,
}

/// Create a connected pair of endpoints — whatever is sent into one
/// side's `tx` arrives on the other side's `rx`.
pub fn endpoint_pair() -> (Endpoint, Endpoint) {
    let (tx_a, rx_a) = unbounded();
    let (tx_b, rx_b) = unbounded();
    (Endpoint { tx: tx_a, rx: rx_b }, Endpoint { tx: tx_b, rx: rx_a })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::message::Tag;

    #[test]
    fn endpoints_are_cross_wired() {
        let (a, b) = endpoint_pair();
        a.tx.send(Envelope::new(0, Tag::Fin, vec![])).unwrap();
        let received = b.rx.recv().unwrap();
        assert_eq!(received.tag, Tag::Fin);

        b.tx.send(Envelope::ack(1)).unwrap();
        let received = a.rx.recv().unwrap();
        assert_eq!(received.tag, Tag::Ack);
    }
}
