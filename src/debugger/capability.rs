/// Answer `qSupported`.
///
/// The client's feature list is ignored; the only capability announced is
/// the largest packet the stub accepts, in hex as the protocol requires.
pub fn negotiate(_client_features: &str, max_packet_size: usize) -> String {
    format!("PacketSize={:x}", max_packet_size)
}
